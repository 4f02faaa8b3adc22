//! Multi-section platform export with a completed-orders block.
//!
//! The export carries no per-trade profit, so realized profit is rebuilt
//! from the filled orders with average-price position accounting:
//!
//! ```text
//! long reduced by a sell:  (fill - avg_entry) * min(position, qty) * POINT_VALUE
//! short reduced by a buy:  (avg_entry - fill) * min(|position|, qty) * POINT_VALUE
//! ```
//!
//! Only a single instrument is modelled. Every fill is valued with the same
//! point value, so mixed-instrument exports are not priced correctly.

use tracing::debug;

use super::fields::{cell, header_names, parse_amount, parse_trade_date, read_table, sections};
use super::DialectParser;
use crate::error::ParseError;
use crate::{Money, Side, TradeRecord};

/// Currency value of one full point move for one contract
pub const POINT_VALUE: i64 = 20;

const STATUS_COLUMN: &str = "status";
const SIDE_COLUMNS: &[&str] = &["buy/sell", "b/s"];
const PRICE_COLUMNS: &[&str] = &["avg fill price"];
const QTY_COLUMNS: &[&str] = &["qty to fill", "filled qty"];
const TIME_COLUMNS: &[&str] = &["create time (edt)"];

/// Dialect B parser
pub struct CompletedOrdersParser;

fn is_orders_header(line: &str) -> bool {
    header_names(line)
        .map(|columns| columns.has("account") && columns.has(STATUS_COLUMN))
        .unwrap_or(false)
}

fn parse_side(value: &str) -> Option<Side> {
    match value.trim().to_ascii_lowercase().as_str() {
        "b" | "buy" => Some(Side::Buy),
        "s" | "sell" => Some(Side::Sell),
        _ => None,
    }
}

impl DialectParser for CompletedOrdersParser {
    fn name(&self) -> &'static str {
        "completed orders"
    }

    fn matches(&self, raw: &str) -> bool {
        sections(raw).iter().any(|section| is_orders_header(section[0]))
    }

    fn parse(&self, raw: &str) -> Result<Vec<TradeRecord>, ParseError> {
        if raw.trim().is_empty() {
            return Err(ParseError::EmptyInput);
        }

        let section = sections(raw)
            .into_iter()
            .find(|section| is_orders_header(section[0]))
            .ok_or(ParseError::NoMatchingSection)?;

        let (columns, records) = read_table(&section)?;

        let status_idx = columns.find(&[STATUS_COLUMN]);
        let side_idx = columns.find(SIDE_COLUMNS);
        let price_idx = columns.find(PRICE_COLUMNS);
        let qty_idx = columns.find(QTY_COLUMNS);
        let time_idx = columns.find(TIME_COLUMNS);

        let (status_idx, side_idx, price_idx, qty_idx, time_idx) =
            match (status_idx, side_idx, price_idx, qty_idx, time_idx) {
                (Some(st), Some(sd), Some(p), Some(q), Some(t)) => (st, sd, p, q, t),
                _ => {
                    let missing = [
                        (status_idx, STATUS_COLUMN),
                        (side_idx, SIDE_COLUMNS[0]),
                        (price_idx, PRICE_COLUMNS[0]),
                        (qty_idx, QTY_COLUMNS[0]),
                        (time_idx, TIME_COLUMNS[0]),
                    ]
                    .into_iter()
                    .filter(|(idx, _)| idx.is_none())
                    .map(|(_, name)| name)
                    .collect();
                    return Err(ParseError::MissingColumns {
                        dialect: self.name(),
                        missing,
                    });
                }
            };

        let mut book = PositionBook::default();
        let mut filled = 0usize;
        let mut trades = Vec::new();

        for (i, record) in records.iter().enumerate() {
            let row = i + 1;

            if !cell(record, status_idx).eq_ignore_ascii_case("filled") {
                continue;
            }
            filled += 1;

            let side_str = cell(record, side_idx);
            let side = parse_side(side_str).ok_or_else(|| ParseError::InvalidSide {
                row,
                value: side_str.to_string(),
            })?;

            let price_str = cell(record, price_idx);
            let price_error = || ParseError::InvalidNumber {
                row,
                column: "avg fill price",
                value: price_str.to_string(),
            };
            let price = parse_amount(price_str)
                .and_then(Money::try_from_f64)
                .ok_or_else(price_error)?;

            let qty_str = cell(record, qty_idx);
            let qty = parse_amount(qty_str)
                .filter(|q| *q > 0.0)
                .and_then(Money::try_from_f64)
                .ok_or_else(|| ParseError::InvalidNumber {
                    row,
                    column: "qty to fill",
                    value: qty_str.to_string(),
                })?;

            let time_str = cell(record, time_idx);
            let entry_date = parse_trade_date(time_str).ok_or_else(|| ParseError::InvalidDate {
                row,
                value: time_str.to_string(),
            })?;

            // Decimal overflow surfaces as an unusable fill price
            let realized = book.apply(side, price, qty).map_err(|Overflow| price_error())?;
            if let Some(realized) = realized {
                trades.push(TradeRecord::new(entry_date, realized.to_f64(), row));
            }
        }

        if filled == 0 {
            return Err(ParseError::NoFilledTrades);
        }
        if trades.is_empty() {
            return Err(ParseError::NoClosedTrades);
        }
        if !book.position.is_zero() {
            debug!(
                "{} contract(s) still open at end of export, avg entry {}",
                book.position, book.avg_entry_price
            );
        }

        Ok(trades)
    }
}

/// Position arithmetic left the decimal range
#[derive(Debug, PartialEq)]
struct Overflow;

/// Running net position for a single instrument
#[derive(Debug, Default)]
struct PositionBook {
    /// Signed contract count: positive long, negative short
    position: Money,
    avg_entry_price: Money,
}

impl PositionBook {
    /// Apply one fill; returns realized profit when the fill reduces the position
    fn apply(&mut self, side: Side, price: Money, qty: Money) -> Result<Option<Money>, Overflow> {
        let reduces = match side {
            Side::Buy => self.position.is_negative(),
            Side::Sell => self.position.is_positive(),
        };

        if !reduces {
            // Open or add: quantity-weighted average entry
            let held = self.position.abs();
            let total = held.checked_add(qty).ok_or(Overflow)?;
            let cost = self
                .avg_entry_price
                .checked_mul(held)
                .zip(price.checked_mul(qty))
                .and_then(|(old, new)| old.checked_add(new))
                .ok_or(Overflow)?;
            self.avg_entry_price = cost.checked_div(total).ok_or(Overflow)?;
            self.position = self.position.checked_add(signed(side, qty)).ok_or(Overflow)?;
            return Ok(None);
        }

        let closing = self.position.abs().min(qty);
        let per_contract = match side {
            Side::Buy => self.avg_entry_price.checked_sub(price),
            Side::Sell => price.checked_sub(self.avg_entry_price),
        };
        let realized = per_contract
            .and_then(|pc| pc.checked_mul(closing))
            .and_then(|value| value.checked_mul(Money::from_i64(POINT_VALUE)))
            .ok_or(Overflow)?;
        self.position = self.position.checked_add(signed(side, closing)).ok_or(Overflow)?;

        let remainder = qty.checked_sub(closing).ok_or(Overflow)?;
        if remainder.is_positive() {
            // Crossed through flat: the rest opens the other way at this fill
            self.position = signed(side, remainder);
            self.avg_entry_price = price;
        } else if self.position.is_zero() {
            self.avg_entry_price = Money::ZERO;
        }

        Ok(Some(realized))
    }
}

fn signed(side: Side, qty: Money) -> Money {
    match side {
        Side::Buy => qty,
        Side::Sell => -qty,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn money(v: f64) -> Money {
        Money::try_from_f64(v).unwrap()
    }

    const HEADER: &str = "Account,Order ID,Buy/Sell,Contract,Status,Avg Fill Price,Qty To Fill,Create Time (EDT)";

    fn export(rows: &[&str]) -> String {
        let mut text = String::from("Account Summary\nAccount,Balance\nDEMO123,50000\n\n");
        text.push_str(HEADER);
        text.push('\n');
        for row in rows {
            text.push_str(row);
            text.push('\n');
        }
        text
    }

    #[test]
    fn test_long_round_trip() {
        let mut book = PositionBook::default();
        assert_eq!(book.apply(Side::Buy, money(100.0), money(2.0)), Ok(None));
        assert_eq!(book.apply(Side::Sell, money(105.0), money(1.0)), Ok(Some(money(100.0))));
        assert_eq!(book.apply(Side::Sell, money(95.0), money(1.0)), Ok(Some(money(-100.0))));
        assert!(book.position.is_zero());
    }

    #[test]
    fn test_short_round_trip() {
        let mut book = PositionBook::default();
        book.apply(Side::Sell, money(100.0), money(1.0)).unwrap();
        assert_eq!(book.apply(Side::Buy, money(98.0), money(1.0)), Ok(Some(money(40.0))));
    }

    #[test]
    fn test_add_to_position_averages_entry() {
        let mut book = PositionBook::default();
        book.apply(Side::Buy, money(100.0), money(1.0)).unwrap();
        book.apply(Side::Buy, money(102.0), money(1.0)).unwrap();
        assert_eq!(book.avg_entry_price, money(101.0));
        assert_eq!(book.apply(Side::Sell, money(103.0), money(2.0)), Ok(Some(money(80.0))));
    }

    #[test]
    fn test_reverse_position() {
        let mut book = PositionBook::default();
        book.apply(Side::Buy, money(100.0), money(1.0)).unwrap();

        // Sell 2: close the long, open a short of 1 at 110
        assert_eq!(book.apply(Side::Sell, money(110.0), money(2.0)), Ok(Some(money(200.0))));
        assert_eq!(book.position, money(-1.0));
        assert_eq!(book.avg_entry_price, money(110.0));

        assert_eq!(book.apply(Side::Buy, money(105.0), money(1.0)), Ok(Some(money(100.0))));
    }

    #[test]
    fn test_selects_orders_section_and_filters_filled() {
        let raw = export(&[
            "DEMO123,1,B,NQH4,Filled,18000.25,1,01/05/2024 09:31:00",
            "DEMO123,2,S,NQH4,Canceled,18100.00,1,01/05/2024 09:40:00",
            "DEMO123,3,S,NQH4,Filled,18010.25,1,01/05/2024 10:02:00",
        ]);
        let parser = CompletedOrdersParser;
        assert!(parser.matches(&raw));

        let trades = parser.parse(&raw).unwrap();
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].profit, 200.0);
        assert_eq!(trades[0].row, 3);
        assert_eq!(trades[0].entry_date.to_string(), "2024-01-05");
    }

    #[test]
    fn test_no_filled_rows() {
        let raw = export(&[
            "DEMO123,1,B,NQH4,Canceled,18000.25,1,01/05/2024 09:31:00",
            "DEMO123,2,S,NQH4,Rejected,18010.25,1,01/05/2024 10:02:00",
        ]);
        let err = CompletedOrdersParser.parse(&raw).unwrap_err();
        assert!(matches!(err, ParseError::NoFilledTrades));
        assert!(err.to_string().contains("no valid filled trades"));
    }

    #[test]
    fn test_only_opening_fills() {
        let raw = export(&["DEMO123,1,B,NQH4,Filled,18000.25,1,01/05/2024 09:31:00"]);
        let err = CompletedOrdersParser.parse(&raw).unwrap_err();
        assert!(matches!(err, ParseError::NoClosedTrades));
    }

    #[test]
    fn test_no_matching_section() {
        let raw = "Account,Balance\nDEMO123,50000\n\nSymbol,Qty\nNQ,1\n";
        assert!(!CompletedOrdersParser.matches(raw));
        let err = CompletedOrdersParser.parse(raw).unwrap_err();
        assert!(matches!(err, ParseError::NoMatchingSection));
    }

    #[test]
    fn test_missing_columns_are_listed() {
        let raw = "Account,Status,Buy/Sell\nDEMO123,Filled,B\n";
        match CompletedOrdersParser.parse(raw).unwrap_err() {
            ParseError::MissingColumns { missing, .. } => {
                assert_eq!(missing, vec!["avg fill price", "qty to fill", "create time (edt)"])
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_bad_side_marker() {
        let raw = export(&["DEMO123,1,X,NQH4,Filled,18000.25,1,01/05/2024 09:31:00"]);
        let err = CompletedOrdersParser.parse(&raw).unwrap_err();
        assert!(matches!(err, ParseError::InvalidSide { row: 1, .. }));
    }

    #[test]
    fn test_fill_overflow_is_an_invalid_number() {
        for side in ["B", "S"] {
            let row = format!("DEMO123,1,{side},NQH4,Filled,1e20,1e10,01/05/2024 09:31:00");
            let raw = export(&[row.as_str()]);
            match CompletedOrdersParser.parse(&raw).unwrap_err() {
                ParseError::InvalidNumber { row, column, .. } => {
                    assert_eq!(row, 1);
                    assert_eq!(column, "avg fill price");
                }
                other => panic!("unexpected error: {other}"),
            }
        }
    }

    #[test]
    fn test_out_of_range_price_is_rejected() {
        let raw = export(&[
            "DEMO123,1,B,NQH4,Filled,1e30,1,01/05/2024 09:31:00",
            "DEMO123,2,S,NQH4,Filled,100,1,01/05/2024 10:02:00",
        ]);
        let err = CompletedOrdersParser.parse(&raw).unwrap_err();
        assert!(matches!(
            err,
            ParseError::InvalidNumber { row: 1, column: "avg fill price", .. }
        ));
    }

    #[test]
    fn test_out_of_range_qty_is_rejected() {
        let raw = export(&["DEMO123,1,B,NQH4,Filled,100,1e30,01/05/2024 09:31:00"]);
        let err = CompletedOrdersParser.parse(&raw).unwrap_err();
        assert!(matches!(
            err,
            ParseError::InvalidNumber { row: 1, column: "qty to fill", .. }
        ));
    }
}
