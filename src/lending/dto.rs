use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct BorrowRequest {
    pub amount: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BorrowResponse {
    pub purchase_power: f64,
    pub monthly_repayment: f64,
}
