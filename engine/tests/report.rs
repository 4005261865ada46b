use dicegraph::{analyze_fairness, FaceCounts, FairnessAnalyzer, FairnessReport, Roll};

#[test]
fn uniform_report_renders() {
    let report = FairnessAnalyzer::new(0.05)
        .unwrap()
        .analyze_counts(FaceCounts::from_slice(&[10; 6]))
        .unwrap();
    insta::assert_snapshot!(report.render_text(), @r"
    Dice Statistics Analysis
    ========================
    Total rolls: 60
    Sample size: valid (60 of 30 required)

    Face  Count  Percent
       1     10   16.67%
       2     10   16.67%
       3     10   16.67%
       4     10   16.67%
       5     10   16.67%
       6     10   16.67%

    Chi-square test (α = 0.050)
      χ² statistic: 0.000
      p-value:      1.000
      Verdict:      FAIR
      The dice appear to be fair (p=1.000 ≥ α=0.050)
      No significant deviation from fairness at 95.0% confidence level
    ");
}

#[test]
fn insufficient_report_says_so() {
    let rolls: Vec<Roll> = [1, 1, 2].into_iter().map(Roll::Single).collect();
    let text = analyze_fairness(&rolls, 4, 0.1).unwrap().render_text();
    assert!(text.contains("Sample size: insufficient (3 of 20 required)"));
    assert!(text.contains("p-value:      n/a"));
    assert!(text.contains("Verdict:      UNDETERMINED"));
}

#[test]
fn report_json_shape() {
    let rolls: Vec<Roll> = [1, 2].into_iter().map(Roll::Single).collect();
    let report = analyze_fairness(&rolls, 2, 0.05).unwrap();
    let json = serde_json::to_value(&report).unwrap();
    for key in [
        "fairness_test",
        "total_rolls",
        "face_counts",
        "face_percentages",
        "sample_validity",
    ] {
        assert!(json.get(key).is_some(), "missing {key}");
    }
    assert_eq!(json["face_counts"]["1"], 1);
    assert!(json["fairness_test"]["is_fair"].is_null());

    let back: FairnessReport = serde_json::from_value(json).unwrap();
    assert_eq!(back, report);
}
