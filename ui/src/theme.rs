pub const GLOBAL_CSS: &str = r#"
:root {
  --bg: #05090f;
  --bg-elev-1: #0b111a;
  --bg-elev-2: #111a26;
  --border: rgba(255, 255, 255, 0.08);
  --border-strong: rgba(255, 255, 255, 0.16);
  --text: #e6edf7;
  --text-dim: #b7c6d9;
  --text-muted: #7f8ba0;
  --accent: #5cb0ff;
  --surface-hover: rgba(255, 255, 255, 0.05);
  --shadow-soft: 0 14px 42px rgba(0, 0, 0, 0.38);
  --radius: 10px;
  --radius-pill: 999px;
  --space-1: 4px;
  --space-2: 8px;
  --space-3: 12px;
  --space-4: 16px;
  --font-body: "Inter", "SF Pro Text", system-ui, -apple-system, sans-serif;
  --font-size-xs: 11px;
  --font-size-sm: 13px;
  --font-size-md: 15px;
  --transition: 140ms ease-out;
}

.light-theme {
  --bg: #f8fbff;
  --bg-elev-1: #ffffff;
  --bg-elev-2: #edf1f7;
  --border: rgba(0, 0, 0, 0.06);
  --border-strong: rgba(0, 0, 0, 0.12);
  --text: #0c1625;
  --text-dim: #2c3a4f;
  --text-muted: #5b6678;
  --accent: #2563eb;
  --surface-hover: rgba(0, 0, 0, 0.04);
  --shadow-soft: 0 10px 36px rgba(0, 0, 0, 0.14);
}

* { box-sizing: border-box; }
html, body {
  padding: 0;
  margin: 0;
  background: var(--bg);
  color: var(--text);
  font-family: var(--font-body);
  font-size: var(--font-size-sm);
  line-height: 1.4;
}

.dashboard { display: grid; grid-template-columns: repeat(auto-fill, minmax(320px, 1fr)); gap: var(--space-3); padding: var(--space-3); }
.dashboard-toolbar { display: flex; justify-content: flex-end; padding: var(--space-3) var(--space-3) 0; }

.chart-card { display: flex; flex-direction: column; gap: var(--space-2); padding: var(--space-3); background: var(--bg-elev-1); border: 1px solid var(--border); border-radius: var(--radius); min-height: 240px; }
.chart-card-header { display: flex; align-items: center; }
.chart-card-title { font-weight: 600; font-size: var(--font-size-md); }
.chart-card-body { flex: 1; color: var(--text-dim); }

.chart-info-trigger {
  margin-left: var(--space-2);
  display: inline-flex; align-items: center; justify-content: center;
  width: 28px; height: 28px;
  border-radius: var(--radius-pill);
  border: none; background: transparent; color: var(--text-dim);
  font-weight: 500; cursor: pointer;
  transition: background var(--transition);
}
.chart-info-trigger:hover { background: var(--surface-hover); }

.popover-content {
  z-index: 50;
  background: var(--bg-elev-2);
  border: 1px solid var(--border-strong);
  border-radius: var(--radius);
  box-shadow: var(--shadow-soft);
  padding: var(--space-3) var(--space-4);
  transition: opacity var(--transition);
}
.chart-info-title { margin: 0 0 var(--space-2); font-size: var(--font-size-md); }
.chart-info-body { color: var(--text-dim); font-size: var(--font-size-sm); }

.range-option { display: block; width: 100%; text-align: left; padding: var(--space-2); border: none; background: transparent; color: var(--text); border-radius: var(--radius); cursor: pointer; }
.range-option:hover { background: var(--surface-hover); }
"#;
