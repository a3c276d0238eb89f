use anyhow::Result;

use crate::report::diagnostic::{MergeReport, RawFileResult};

/// Render raw results as one compact JSON array, for the next process in a pipe
pub fn render_raw(results: &[RawFileResult]) -> Result<String> {
    let json = serde_json::to_string(results)?;
    Ok(json)
}

/// Render a merged report as pretty-printed JSON
pub fn render_merged(report: &MergeReport) -> Result<String> {
    let json = serde_json::to_string_pretty(report)?;
    Ok(json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::input::{parse_results, InputSource};
    use crate::report::diagnostic::MergeTotals;
    use crate::report::merger::{merge_results, MergeConfig};
    use serde_json::Value;

    const RUN: &str = r#"[{"filePath":"/a/index.js","messages":[{"ruleId":"no-undef","severity":2,"message":"'x' is not defined.","line":2,"column":1,"nodeType":"Identifier"}],"errorCount":1,"warningCount":0,"fixableErrorCount":0,"fixableWarningCount":0,"source":"var y\nx\n"}]"#;

    #[test]
    fn test_raw_output_can_be_read_back() {
        let raw = parse_results(RUN, &InputSource::Stdin).unwrap();
        let out = render_raw(&raw).unwrap();
        assert!(!out.contains('\n'));
        let again = parse_results(&out, &InputSource::Stdin).unwrap();
        assert_eq!(raw, again);
    }

    #[test]
    fn test_merged_report_shape() {
        let mut raw = parse_results(RUN, &InputSource::Stdin).unwrap();
        raw.extend(parse_results(RUN, &InputSource::Stdin).unwrap());
        let files = merge_results(&raw, &MergeConfig::default()).unwrap();
        let report = MergeReport {
            version: "0.0.0".into(),
            timestamp: "2024-01-01T00:00:00+00:00".into(),
            inputs: raw.len(),
            totals: MergeTotals::from_records(&files),
            files,
        };

        let v: Value = serde_json::from_str(&render_merged(&report).unwrap()).unwrap();
        assert_eq!(v["inputs"], 2);
        assert_eq!(v["totals"]["errors"], 1);
        assert_eq!(v["totals"]["files"], 1);

        let file = &v["files"][0];
        assert_eq!(file["filePath"], "/a/index.js");
        assert_eq!(file["occurrence"], 2);
        assert_eq!(file["errorCount"], 1);

        let msg = &file["messages"][0];
        assert_eq!(msg["ruleId"], "no-undef");
        assert_eq!(msg["occurrence"], 2);
        assert_eq!(msg["belowThreshold"], false);
        assert_eq!(msg["sourceFile"], "/a/index.js");
        assert_eq!(msg["nodeType"], "Identifier");
        assert!(msg["id"].as_str().unwrap().starts_with("LMX-"));
        // The file snapshot stays out of the report.
        assert!(msg.get("fileSource").is_none());
    }
}
