//! ExecutionLedger — cash, position, trade log and equity curve.
//!
//! Orders fill in full at the price they carry. No fees, no slippage.

use chrono::{DateTime, Utc};

use crate::domain::{Order, OrderSide, Trade, TradeAction};
use crate::error::LedgerError;

#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionLedger {
    starting_cash: f64,
    cash: f64,
    position: f64,
    trades: Vec<Trade>,
    equity_curve: Vec<f64>,
}

impl ExecutionLedger {
    /// The equity curve starts with `starting_cash` as its seed point.
    pub fn new(starting_cash: f64) -> Self {
        Self {
            starting_cash,
            cash: starting_cash,
            position: 0.0,
            trades: Vec::new(),
            equity_curve: vec![starting_cash],
        }
    }

    /// Apply one order and record the resulting trade.
    pub fn apply(&mut self, ts: DateTime<Utc>, order: &Order) -> Result<&Trade, LedgerError> {
        if !order.price.is_finite() {
            return Err(LedgerError::InvalidPrice(order.price));
        }

        let trade = match order.side {
            OrderSide::Long => {
                if self.position != 0.0 {
                    return Err(LedgerError::EntryWhileHolding {
                        position: self.position,
                    });
                }
                if !(order.size.is_finite() && order.size > 0.0) {
                    return Err(LedgerError::InvalidSize(order.size));
                }
                self.cash -= order.size * order.price;
                self.position = order.size;
                Trade {
                    ts,
                    action: TradeAction::Buy,
                    price: order.price,
                    size: order.size,
                }
            }
            OrderSide::Flat => {
                if self.position == 0.0 {
                    return Err(LedgerError::ExitWhileFlat);
                }
                // always closes the whole position, whatever size the order says
                let size = self.position;
                self.cash += size * order.price;
                self.position = 0.0;
                Trade {
                    ts,
                    action: TradeAction::Sell,
                    price: order.price,
                    size,
                }
            }
        };

        self.trades.push(trade);
        Ok(&self.trades[self.trades.len() - 1])
    }

    /// Append `cash + position * close` to the equity curve and return it.
    pub fn mark(&mut self, close: f64) -> f64 {
        let equity = self.cash + self.position * close;
        self.equity_curve.push(equity);
        equity
    }

    pub fn starting_cash(&self) -> f64 {
        self.starting_cash
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn equity_curve(&self) -> &[f64] {
        &self.equity_curve
    }

    /// Consume the ledger, yielding the trade log and the equity curve.
    pub fn into_parts(self) -> (Vec<Trade>, Vec<f64>) {
        (self.trades, self.equity_curve)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 2, hour, 0, 0).unwrap()
    }

    #[test]
    fn seeded_with_starting_cash() {
        let ledger = ExecutionLedger::new(50_000.0);
        assert_eq!(ledger.equity_curve(), &[50_000.0]);
        assert_eq!(ledger.cash(), 50_000.0);
        assert_eq!(ledger.position(), 0.0);
    }

    #[test]
    fn round_trip_changes_cash_by_price_difference() {
        let mut ledger = ExecutionLedger::new(1_000.0);
        let buy = ledger.apply(ts(0), &Order::long(2.0, 100.0)).unwrap().clone();
        assert_eq!(buy.action, TradeAction::Buy);
        assert_eq!(ledger.cash(), 800.0);
        assert_eq!(ledger.position(), 2.0);

        let sell = ledger.apply(ts(1), &Order::flat(2.0, 110.0)).unwrap().clone();
        assert_eq!(sell.action, TradeAction::Sell);
        assert_eq!(sell.size, 2.0);
        assert_eq!(ledger.cash(), 1_020.0);
        assert_eq!(ledger.position(), 0.0);
        assert_eq!(ledger.trades().len(), 2);
    }

    #[test]
    fn mark_values_position_at_close() {
        let mut ledger = ExecutionLedger::new(1_000.0);
        ledger.apply(ts(0), &Order::long(1.0, 100.0)).unwrap();
        assert_eq!(ledger.mark(100.0), 1_000.0);
        assert_eq!(ledger.mark(105.0), 1_005.0);
        assert_eq!(ledger.equity_curve(), &[1_000.0, 1_000.0, 1_005.0]);
    }

    #[test]
    fn entry_while_holding_is_rejected() {
        let mut ledger = ExecutionLedger::new(1_000.0);
        ledger.apply(ts(0), &Order::long(1.0, 100.0)).unwrap();
        let err = ledger.apply(ts(1), &Order::long(1.0, 101.0)).unwrap_err();
        assert_eq!(err, LedgerError::EntryWhileHolding { position: 1.0 });
        assert_eq!(ledger.trades().len(), 1);
    }

    #[test]
    fn exit_while_flat_is_rejected() {
        let mut ledger = ExecutionLedger::new(1_000.0);
        let err = ledger.apply(ts(0), &Order::flat(1.0, 100.0)).unwrap_err();
        assert_eq!(err, LedgerError::ExitWhileFlat);
        assert_eq!(ledger.cash(), 1_000.0);
    }

    #[test]
    fn bad_size_and_price_are_rejected() {
        let mut ledger = ExecutionLedger::new(1_000.0);
        assert_eq!(
            ledger.apply(ts(0), &Order::long(0.0, 100.0)).unwrap_err(),
            LedgerError::InvalidSize(0.0)
        );
        assert!(matches!(
            ledger.apply(ts(0), &Order::long(1.0, f64::NAN)).unwrap_err(),
            LedgerError::InvalidPrice(_)
        ));
    }
}
