use dicegraph::{analyze_fairness, chi_square, simulate_run, Dice, Roll, DEFAULT_ALPHA};
use jni::objects::{JClass, JString};
use jni::sys::jstring;
use jni::JNIEnv;
use serde::Deserialize;
use serde_json::json;

#[derive(Deserialize)]
struct AnalyzeRequest {
    rolls: Vec<Roll>,
    faces: u32,
    #[serde(default = "default_alpha")]
    alpha: f64,
}

#[derive(Deserialize)]
struct ChiSquareRequest {
    observed: Vec<u64>,
    #[serde(default)]
    expected_probs: Option<Vec<f64>>,
}

#[derive(Deserialize)]
struct SimulateRequest {
    num_rolls: usize,
    num_dice: usize,
    faces: u32,
    #[serde(default)]
    seed: Option<u64>,
}

fn default_alpha() -> f64 {
    DEFAULT_ALPHA
}

fn ok_json(value: serde_json::Value) -> String {
    json!({ "ok": true, "result": value }).to_string()
}

fn err_json(e: impl std::fmt::Display) -> String {
    json!({ "ok": false, "error": e.to_string() }).to_string()
}

fn respond<T: serde::Serialize>(result: Result<T, String>) -> String {
    match result.and_then(|v| serde_json::to_value(v).map_err(|e| e.to_string())) {
        Ok(value) => ok_json(value),
        Err(e) => err_json(e),
    }
}

// Pure-Rust twins of the JNI entry points, testable without a JVM.

pub fn analyze_fairness_internal(input: &str) -> String {
    respond(
        serde_json::from_str::<AnalyzeRequest>(input)
            .map_err(|e| format!("invalid_request: {}", e))
            .and_then(|req| {
                analyze_fairness(&req.rolls, req.faces, req.alpha).map_err(|e| e.to_string())
            }),
    )
}

pub fn chi_square_internal(input: &str) -> String {
    respond(
        serde_json::from_str::<ChiSquareRequest>(input)
            .map_err(|e| format!("invalid_request: {}", e))
            .and_then(|req| {
                chi_square(&req.observed, req.expected_probs.as_deref()).map_err(|e| e.to_string())
            }),
    )
}

pub fn simulate_internal(input: &str) -> String {
    respond(
        serde_json::from_str::<SimulateRequest>(input)
            .map_err(|e| format!("invalid_request: {}", e))
            .and_then(|req| {
                let mut dice = match req.seed {
                    Some(seed) => Dice::from_seed(seed),
                    None => Dice::from_entropy(),
                };
                simulate_run(&mut dice, req.num_rolls, req.num_dice, req.faces)
                    .map_err(|e| e.to_string())
            }),
    )
}

fn call_json(mut env: JNIEnv, json: JString, f: fn(&str) -> String) -> jstring {
    let out = match env.get_string(&json) {
        Ok(s) => f(&String::from(s)),
        Err(e) => err_json(e),
    };
    match env.new_string(out) {
        Ok(s) => s.into_raw(),
        Err(_) => std::ptr::null_mut(),
    }
}

#[no_mangle]
pub extern "system" fn Java_com_dicegraph_Ffi_version<'local>(
    env: JNIEnv<'local>,
    _class: JClass<'local>,
) -> jstring {
    match env.new_string(concat!("dicegraph-ffi ", env!("CARGO_PKG_VERSION"))) {
        Ok(s) => s.into_raw(),
        Err(_) => std::ptr::null_mut(),
    }
}

#[no_mangle]
pub extern "system" fn Java_com_dicegraph_Ffi_analyzeFairnessJson(
    env: JNIEnv,
    _class: JClass,
    json: JString,
) -> jstring {
    call_json(env, json, analyze_fairness_internal)
}

#[no_mangle]
pub extern "system" fn Java_com_dicegraph_Ffi_chiSquareJson(
    env: JNIEnv,
    _class: JClass,
    json: JString,
) -> jstring {
    call_json(env, json, chi_square_internal)
}

#[no_mangle]
pub extern "system" fn Java_com_dicegraph_Ffi_simulateJson(
    env: JNIEnv,
    _class: JClass,
    json: JString,
) -> jstring {
    call_json(env, json, simulate_internal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn parse(s: &str) -> Value {
        serde_json::from_str(s).unwrap()
    }

    #[test]
    fn analyze_returns_report() {
        let rolls: Vec<u32> = (0..60).map(|i| i % 6 + 1).collect();
        let input = json!({ "rolls": rolls, "faces": 6 }).to_string();
        let out = parse(&analyze_fairness_internal(&input));
        assert_eq!(out["ok"], true);
        assert_eq!(out["result"]["total_rolls"], 60);
        assert_eq!(out["result"]["fairness_test"]["is_fair"], true);
        assert_eq!(out["result"]["fairness_test"]["alpha"], 0.05);
    }

    #[test]
    fn analyze_accepts_multi_die_rolls() {
        let out = parse(&analyze_fairness_internal(
            r#"{"rolls": [[1, 2], [3, 4]], "faces": 4, "alpha": 0.1}"#,
        ));
        assert_eq!(out["ok"], true);
        assert_eq!(out["result"]["total_rolls"], 4);
        assert!(out["result"]["fairness_test"]["is_fair"].is_null());
    }

    #[test]
    fn errors_are_wrapped() {
        let out = parse(&analyze_fairness_internal(r#"{"rolls": [], "faces": 1}"#));
        assert_eq!(out["ok"], false);
        assert!(out["error"].as_str().unwrap().contains("at least 2 faces"));

        let out = parse(&analyze_fairness_internal("not json"));
        assert!(out["error"].as_str().unwrap().starts_with("invalid_request"));
    }

    #[test]
    fn chi_square_round_trip() {
        let out = parse(&chi_square_internal(r#"{"observed": [0, 0, 0, 0, 0, 60]}"#));
        assert_eq!(out["ok"], true);
        assert_eq!(out["result"]["statistic"], 300.0);
        assert_eq!(out["result"]["degrees_of_freedom"], 5);
    }

    #[test]
    fn simulate_is_deterministic_with_seed() {
        let input = r#"{"num_rolls": 4, "num_dice": 2, "faces": 6, "seed": 9}"#;
        let a = parse(&simulate_internal(input));
        let b = parse(&simulate_internal(input));
        assert_eq!(a, b);
        assert_eq!(a["result"]["rolls"].as_array().unwrap().len(), 4);
    }
}
