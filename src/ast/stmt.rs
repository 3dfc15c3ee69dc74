use serde::{Deserialize, Serialize};

use super::expr::Expr;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stmt {
    /// Expression statement (calls, assignments)
    Expr(Expr),

    /// Return statement
    Return(Option<Expr>),
}
