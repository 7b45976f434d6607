use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ShiftStats {
    pub total_shifts: usize,
    pub total_hours: f64,
    pub average_shift_hours: f64,
    pub longest_shift_hours: f64,
    pub overnight_shifts: usize,
    pub shifts_by_type: BTreeMap<String, usize>,
    pub shifts_by_status: BTreeMap<String, usize>,
}
