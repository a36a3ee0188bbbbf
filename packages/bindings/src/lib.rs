use napi::Result as NapiResult;
use napi_derive::napi;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Unit-mix model
// ---------------------------------------------------------------------------

#[napi]
pub fn evaluate_unit_mix(input_json: String) -> NapiResult<String> {
    let input: unit_mix_core::unit_mix::model::UnitMixInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        unit_mix_core::unit_mix::model::evaluate_unit_mix(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn optimize_mix(input_json: String) -> NapiResult<String> {
    let input: unit_mix_core::unit_mix::optimizer::MixOptimizerInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        unit_mix_core::unit_mix::optimizer::optimize_mix(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[napi]
pub fn mix_sensitivity(input_json: String) -> NapiResult<String> {
    let input: unit_mix_core::scenarios::sensitivity::MixSensitivityInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        unit_mix_core::scenarios::sensitivity::mix_sensitivity(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
