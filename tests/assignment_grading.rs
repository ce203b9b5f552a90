mod support;

use chrono::TimeDelta;
use pretty_assertions::assert_eq;
use support::{Fixture, json_report_script};
use tally::{Fraction, Submission, grade::AssignmentGrade};

/// An assignment scoring 9/10 before penalties, with `penalties` appended
/// to its configuration.
fn nine_tenths(penalties: &str) -> Fixture {
    let fixture = Fixture::new();
    fixture
        .grading_file("report.sh", &json_report_script(&[("suite", 9, 10)]))
        .config(&format!(
            r#"
name = "Homework 2"

[[components]]
name = "Tests"
backend = {{ kind = "json-report", command = "sh report.sh" }}
grading-files = ["report.sh"]
parts = [{{ description = "suite" }}]
{penalties}
"#
        ));
    fixture
}

/// Flat deduction then cap, or the reverse.
fn fixed_penalties(first: &str, second: &str) -> String {
    format!(
        r#"
[[penalties]]
name = "FIRST"
backend = {{ kind = "fixed", penalty = "{first}" }}

[[penalties]]
name = "SECOND"
backend = {{ kind = "fixed", penalty = "{second}" }}
"#
    )
}

fn three_components() -> Fixture {
    let fixture = Fixture::new();
    fixture
        .submit("answer.txt", "42\n")
        .grading_file("check.sh", "grep -q \"^$1$\" answer.txt\n")
        .grading_file("build.sh", "echo 'answer.txt: syntax error' >&2\nexit 3\n")
        .config(
            r#"
name = "Homework 3"

[[components]]
name = "Answers"
weight = 2
files = ["answer.txt"]
grading-files = ["check.sh"]
backend = { kind = "test-command", run = "sh check.sh {test}" }
parts = [
    { description = "the answer", target = "42" },
    { description = "a wrong answer", target = "41", weight = 3 },
]

[[components]]
name = "Build"
grading-files = ["build.sh"]
backend = { kind = "test-command", build = "sh build.sh", run = "sh -c true" }
parts = [{ description = "builds" }]

[[components]]
name = "Smoke"
weight = "1/2"
backend = { kind = "multi-command" }
parts = [
    { description = "true", target = "true" },
    { description = "echo", target = "echo hi" },
]
"#,
        );
    fixture
}

#[tokio::test(flavor = "multi_thread")]
async fn penalties_apply_in_declared_order() {
    let flat_first = nine_tenths(&fixed_penalties("10 pts", "80 max-pts"));
    let grade = flat_first
        .assignment()
        .grade(&Submission::new(flat_first.submission()))
        .await;
    assert_eq!(grade.raw_score, Fraction::new(9, 10));
    assert_eq!(grade.final_score, Fraction::new(4, 5));
    assert_eq!(grade.penalties[0].points_deducted, Fraction::new(1, 10));
    assert_eq!(grade.penalties[1].points_deducted, Fraction::zero());

    let cap_first = nine_tenths(&fixed_penalties("80 max-pts", "10 pts"));
    let grade = cap_first
        .assignment()
        .grade(&Submission::new(cap_first.submission()))
        .await;
    assert_eq!(grade.final_score, Fraction::new(7, 10));
    assert_eq!(grade.penalties[0].name, "FIRST");
    assert_eq!(grade.penalties[0].points_deducted, Fraction::new(1, 10));
    assert_eq!(grade.penalties[1].points_deducted, Fraction::new(1, 10));
}

#[tokio::test(flavor = "multi_thread")]
async fn no_penalties_means_final_equals_raw() {
    let fixture = nine_tenths("");
    let grade = fixture
        .assignment()
        .grade(&Submission::new(fixture.submission()))
        .await;
    assert_eq!(grade.final_score, grade.raw_score);
    assert!(grade.penalties.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn late_submissions_lose_points() {
    let fixture = nine_tenths(
        r#"
[[penalties]]
name = "LATE"

[penalties.backend]
kind = "late"
rules = [{ after = "1h", penalty = "25 pts" }, { after = "1d", penalty = "1" }]
"#,
    );
    let assignment = fixture.assignment();

    let two_hours = Submission::new(fixture.submission()).with_late_by(TimeDelta::hours(2));
    let grade = assignment.grade(&two_hours).await;
    assert_eq!(grade.final_score, Fraction::new(13, 20));
    assert_eq!(grade.penalties[0].points_deducted, Fraction::new(1, 4));

    let two_days = Submission::new(fixture.submission()).with_late_by(TimeDelta::days(2));
    assert_eq!(assignment.grade(&two_days).await.final_score, Fraction::zero());

    let on_time = Submission::new(fixture.submission()).with_late_by(TimeDelta::minutes(-5));
    assert_eq!(assignment.grade(&on_time).await.final_score, Fraction::new(9, 10));
}

#[tokio::test(flavor = "multi_thread")]
async fn a_broken_component_does_not_stop_its_siblings() {
    let fixture = three_components();
    let grade = fixture
        .assignment()
        .grade(&Submission::new(fixture.submission()))
        .await;

    let names: Vec<&str> = grade.components.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["Answers", "Build", "Smoke"]);

    let build = &grade.components[1];
    let error = build.error().expect("build errored");
    assert!(!error.is_autograder_fault);
    assert_eq!(build.points_received(), Fraction::zero());
    assert!(grade.has_errors());

    // Answers: weight 2 of 7/2, one of four part-weights earned.
    assert_eq!(grade.components[0].norm_weight, Fraction::new(4, 7));
    assert_eq!(grade.components[0].points_received(), Fraction::new(1, 7));
    // Smoke: weight 1/2 of 7/2, everything earned.
    assert_eq!(grade.components[2].points_received(), Fraction::new(1, 7));
    assert_eq!(grade.raw_score, Fraction::new(2, 7));
}

#[tokio::test(flavor = "multi_thread")]
async fn component_points_are_the_sum_of_part_points() {
    let fixture = three_components();
    let grade = fixture
        .assignment()
        .grade(&Submission::new(fixture.submission()))
        .await;

    for component in &grade.components {
        if let Some(parts) = component.parts() {
            let summed: Fraction = parts.iter().map(|part| part.points_received()).sum();
            assert_eq!(summed * &component.norm_weight, component.points_received());
        }
    }
    let total: Fraction = grade.components.iter().map(|c| c.points_received()).sum();
    assert_eq!(total, grade.raw_score);
}

#[tokio::test(flavor = "multi_thread")]
async fn float_weights_stay_exact() {
    let fixture = Fixture::new();
    fixture
        .grading_file(
            "report.sh",
            &json_report_script(&[("first", 96, 97), ("second", 88, 89), ("third", 82, 83)]),
        )
        .config(
            r#"
name = "Homework 4"

[[components]]
name = "Unit"
weight = 0.30000000000000004
grading-files = ["report.sh"]
backend = { kind = "json-report", command = "sh report.sh" }
parts = [
    { description = "first", weight = 0.1 },
    { description = "second", weight = 0.30000000000000004 },
    { description = "third", weight = 0.6000000000000001 },
]

[[components]]
name = "Smoke"
weight = 0.7
backend = { kind = "multi-command" }
parts = [
    { description = "true", target = "true", weight = 0.7 },
    { description = "false", target = "false", weight = 0.30000000000000004 },
]

[[components]]
name = "Extra"
weight = 0.123456789
backend = { kind = "multi-command" }
parts = [{ description = "true", target = "true" }]
"#,
        );

    let grade = fixture
        .assignment()
        .grade(&Submission::new(fixture.submission()))
        .await;
    assert!(!grade.has_errors());

    let f = |text: &str| text.parse::<Fraction>().expect("valid fraction");
    let unit = (f("0.1") * Fraction::new(96, 97)
        + f("0.30000000000000004") * Fraction::new(88, 89)
        + f("0.6000000000000001") * Fraction::new(82, 83))
        / (f("0.1") + f("0.30000000000000004") + f("0.6000000000000001"));
    let smoke = f("0.7") / (f("0.7") + f("0.30000000000000004"));
    let expected = (f("0.30000000000000004") * unit + f("0.7") * smoke + f("0.123456789"))
        / (f("0.30000000000000004") + f("0.7") + f("0.123456789"));

    assert_eq!(grade.raw_score, expected);
    assert!(grade.raw_score > Fraction::zero() && grade.raw_score < Fraction::one());
    let norm_total: Fraction = grade.components.iter().map(|c| &c.norm_weight).sum();
    assert_eq!(norm_total, Fraction::one());
}

#[tokio::test(flavor = "multi_thread")]
async fn grading_twice_gives_the_same_document() {
    let fixture = three_components();
    let assignment = fixture.assignment();
    let submission = Submission::new(fixture.submission());

    let first = serde_json::to_string_pretty(&assignment.grade(&submission).await).expect("json");
    let second = serde_json::to_string_pretty(&assignment.grade(&submission).await).expect("json");
    assert_eq!(first, second);
}

#[tokio::test(flavor = "multi_thread")]
async fn the_document_round_trips_with_exact_scores() {
    let fixture = three_components();
    let grade = fixture
        .assignment()
        .grade(&Submission::new(fixture.submission()))
        .await;

    let json = serde_json::to_value(&grade).expect("serializes");
    assert_eq!(json["name"], "Homework 3");
    assert_eq!(json["raw_score"], "2/7");
    assert_eq!(json["max_points"], "100");
    assert_eq!(json["components"][0]["parts"][1]["norm_weight"], "3/4");
    assert_eq!(json["components"][0]["parts"][1]["status"], "graded");
    assert_eq!(json["components"][1]["error"]["is_autograder_fault"], false);
    assert!(json["components"][1].get("parts").is_none());

    let parsed = AssignmentGrade::from_json(&json.to_string()).expect("parses");
    assert_eq!(parsed, grade);
}
