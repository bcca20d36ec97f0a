//! Orders emitted by strategies.

use serde::{Deserialize, Serialize};

/// Target exposure requested by an order.
///
/// There are only two: go long one unit from flat, or close the whole
/// position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Long,
    Flat,
}

/// A full-entry or full-exit order at a given price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub side: OrderSide,
    pub size: f64,
    pub price: f64,
}

impl Order {
    pub fn long(size: f64, price: f64) -> Self {
        Self {
            side: OrderSide::Long,
            size,
            price,
        }
    }

    pub fn flat(size: f64, price: f64) -> Self {
        Self {
            side: OrderSide::Flat,
            size,
            price,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn side_serializes_lowercase() {
        let json = serde_json::to_string(&Order::long(1.0, 102.0)).unwrap();
        assert_eq!(json, r#"{"side":"long","size":1.0,"price":102.0}"#);
    }
}
