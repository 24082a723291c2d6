// 该文件是 Tianyan （田眼） 项目的一部分。
// src/output/html.rs - HTML 页面与结果片段
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use crate::{model::HealthStatus, round2, task::YieldReport};

pub const HOME_PAGE: &str = r#"<h2>Plant Analysis Dashboard</h2>
<ul>
  <li><a href="/weed-form">Weed Detection</a></li>
  <li><a href="/health-form">Health Classification</a></li>
  <li><a href="/yield-form">Yield Prediction</a></li>
</ul>
"#;

pub const WEED_FORM: &str = r#"<h2>Weed Detection</h2>
<form action="/predict-weed" method="post" enctype="multipart/form-data">
    <input type="file" name="image" accept="image/*" required>
    <button type="submit">Detect Weeds</button>
</form>
<p><a href="/">Back to Home</a></p>
"#;

pub const HEALTH_FORM: &str = r#"<h2>Plant Health Classification</h2>
<form action="/health" method="post" enctype="multipart/form-data">
    <input type="file" name="image" accept="image/*" required>
    <button type="submit">Check Health</button>
</form>
<p><a href="/">Back to Home</a></p>
"#;

pub const YIELD_FORM: &str = r#"<h2>Yield Prediction</h2>
<form action="/predict-yield" method="post" enctype="multipart/form-data">
    <h3>Upload Canopy Image (optional)</h3>
    <input type="file" name="image" accept="image/*"><br><br>
    <h3>Enter Environmental Data (optional)</h3>
    <input type="number" step="0.1" name="avg_temp" placeholder="Average Temperature (°C)"><br>
    <input type="number" step="0.01" name="pesticides" placeholder="Pesticides Used (tonnes)"><br>
    <input type="number" step="0.01" name="rainfall" placeholder="Average Rainfall (mm/year)"><br><br>
    <button type="submit">Predict Yield</button>
</form>
<p><a href="/">Back to Home</a></p>
"#;

pub const NO_INPUTS: &str =
  "No inputs provided! Please upload a canopy image or enter environment data.";

pub fn health_result(status: HealthStatus) -> String {
  format!(
    "<h3>Plant Health Status: <b>{}</b></h3><p><a href='/health-form'>Back</a></p>",
    status
  )
}

/// 产量结果；两项输入都缺失时返回提示文字
pub fn yield_result(report: &YieldReport) -> String {
  let rows = report.rows();
  if rows.is_empty() {
    return NO_INPUTS.to_string();
  }

  let mut html = String::from("<h2>Yield Prediction Results</h2>");
  for (key, value) in rows {
    html.push_str(&format!("<p><b>{}:</b> {:?}</p>", key, round2(value)));
  }
  html.push_str("<p><a href='/yield-form'>Back</a></p>");
  html
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{cover::CoverFeatures, harvest::YieldEstimate};

  #[test]
  fn health_fragment_names_status() {
    let html = health_result(HealthStatus::NotHealthy);
    assert!(html.contains("<b>Not Healthy</b>"));
  }

  #[test]
  fn empty_yield_report_asks_for_input() {
    let report = YieldReport {
      cover: None,
      estimate: YieldEstimate::None,
    };
    assert_eq!(yield_result(&report), NO_INPUTS);
  }

  #[test]
  fn yield_fragment_lists_all_rows() {
    let report = YieldReport {
      cover: Some(CoverFeatures::new(80.0, 30.0)),
      estimate: YieldEstimate::from_parts(Some(1.45), Some(0.2)),
    };
    let html = yield_result(&report);
    assert!(html.starts_with("<h2>Yield Prediction Results</h2>"));
    assert!(html.contains("<p><b>Crop Cover (%):</b> 50.0</p>"));
    assert!(html.contains("<p><b>Yield from Canopy (t/ha):</b> 1.45</p>"));
    assert!(html.contains("<p><b>Hybrid Yield (t/ha):</b> 0.95</p>"));
  }
}
