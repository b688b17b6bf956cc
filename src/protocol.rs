/// Broadcast wire format for the quote/index feed
///
/// Every packet is one type-tag byte followed by a fixed-width little-endian
/// payload. Frames carry packets back-to-back with no delimiter other than
/// the next tag byte.
///
/// Tags: 61 LTP, 62 Quote, 63 Full, 64 IndexLTP, 65 IndexQuote, 66 IndexFull.

use serde::{Deserialize, Serialize};

/// Payload widths in bytes, after the tag byte.
pub const LTP_PAYLOAD_SIZE: usize = 22;
pub const QUOTE_PAYLOAD_SIZE: usize = 66;
pub const FULL_PAYLOAD_SIZE: usize = 174;
pub const INDEX_LTP_PAYLOAD_SIZE: usize = 22;
pub const INDEX_QUOTE_PAYLOAD_SIZE: usize = 42;
pub const INDEX_FULL_PAYLOAD_SIZE: usize = 38;

/// A Full packet opens with exactly five 20-byte depth levels.
pub const DEPTH_LEVELS: usize = 5;
pub const DEPTH_LEVEL_SIZE: usize = 20;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketType {
    Ltp = 61,
    Quote = 62,
    Full = 63,
    IndexLtp = 64,
    IndexQuote = 65,
    IndexFull = 66,
}

impl PacketType {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            61 => Some(PacketType::Ltp),
            62 => Some(PacketType::Quote),
            63 => Some(PacketType::Full),
            64 => Some(PacketType::IndexLtp),
            65 => Some(PacketType::IndexQuote),
            66 => Some(PacketType::IndexFull),
            _ => None,
        }
    }

    /// Fixed payload width for this packet type, excluding the tag byte.
    pub fn payload_size(self) -> usize {
        match self {
            PacketType::Ltp => LTP_PAYLOAD_SIZE,
            PacketType::Quote => QUOTE_PAYLOAD_SIZE,
            PacketType::Full => FULL_PAYLOAD_SIZE,
            PacketType::IndexLtp => INDEX_LTP_PAYLOAD_SIZE,
            PacketType::IndexQuote => INDEX_QUOTE_PAYLOAD_SIZE,
            PacketType::IndexFull => INDEX_FULL_PAYLOAD_SIZE,
        }
    }
}

/// One level of the five-level market depth in a Full packet.
/// Wire layout: buy_qty u32, sell_qty u32, buy_orders u16, sell_orders u16,
/// buy_price f32, sell_price f32 (20 bytes).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketDepth {
    pub buy_quantity: u32,
    pub sell_quantity: u32,
    pub buy_orders: u16,
    pub sell_orders: u16,
    pub buy_price: f32,
    pub sell_price: f32,
}

/// Last-traded-price update (tag 61).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ltp {
    pub packet_type: u8,
    pub security_id: u32,
    pub tradable: u8,
    pub mode: u8,
    pub last_price: f32,
    pub last_trade_time: u32,
    pub change_absolute: f32,
    pub change_percent: f32,
}

/// Quote update with traded totals, OHLC and 52-week range (tag 62).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub packet_type: u8,
    pub security_id: u32,
    pub tradable: u8,
    pub mode: u8,
    pub last_price: f32,
    pub last_trade_time: u32,
    pub last_traded_quantity: u32,
    pub average_traded_price: f32,
    pub volume_traded: u32,
    pub total_buy_quantity: u32,
    pub total_sell_quantity: u32,
    pub open: f32,
    pub close: f32,
    pub high: f32,
    pub low: f32,
    pub change_percent: f32,
    pub change_absolute: f32,
    pub week52_high: f32,
    pub week52_low: f32,
}

/// Quote fields plus market depth and open interest (tag 63).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Full {
    pub packet_type: u8,
    pub security_id: u32,
    pub tradable: u8,
    pub mode: u8,
    pub market_depth: [MarketDepth; DEPTH_LEVELS],
    pub last_price: f32,
    pub last_trade_time: u32,
    pub last_traded_quantity: u32,
    pub average_traded_price: f32,
    pub volume_traded: u32,
    pub total_buy_quantity: u32,
    pub total_sell_quantity: u32,
    pub open: f32,
    pub close: f32,
    pub high: f32,
    pub low: f32,
    pub change_percent: f32,
    pub change_absolute: f32,
    pub week52_high: f32,
    pub week52_low: f32,
    pub oi: u32,
    pub change_oi: u32,
}

/// Index last-price update (tag 64). Carries an update time, not a trade time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndexLtp {
    pub packet_type: u8,
    pub security_id: u32,
    pub tradable: u8,
    pub mode: u8,
    pub last_price: f32,
    pub last_update_time: u32,
    pub change_absolute: f32,
    pub change_percent: f32,
}

/// Index quote with OHLC and 52-week range (tag 65). No timestamp field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndexQuote {
    pub packet_type: u8,
    pub security_id: u32,
    pub tradable: u8,
    pub mode: u8,
    pub last_price: f32,
    pub open: f32,
    pub close: f32,
    pub high: f32,
    pub low: f32,
    pub change_percent: f32,
    pub change_absolute: f32,
    pub week52_high: f32,
    pub week52_low: f32,
}

/// Index full update with OHLC, change and trade time (tag 66).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndexFull {
    pub packet_type: u8,
    pub security_id: u32,
    pub tradable: u8,
    pub mode: u8,
    pub last_price: f32,
    pub open: f32,
    pub close: f32,
    pub high: f32,
    pub low: f32,
    pub change_percent: f32,
    pub change_absolute: f32,
    pub last_trade_time: u32,
}

/// Closed set of decoded market-data records, discriminated by `packet_type`.
///
/// Serializes untagged to a flat JSON object; the embedded `packet_type`
/// field is the discriminant other readers key on, so deserialization
/// dispatches on it rather than trying variants structurally.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MarketData {
    Ltp(Ltp),
    Quote(Quote),
    Full(Full),
    IndexLtp(IndexLtp),
    IndexQuote(IndexQuote),
    IndexFull(IndexFull),
}

impl MarketData {
    pub fn packet_type(&self) -> PacketType {
        match self {
            MarketData::Ltp(_) => PacketType::Ltp,
            MarketData::Quote(_) => PacketType::Quote,
            MarketData::Full(_) => PacketType::Full,
            MarketData::IndexLtp(_) => PacketType::IndexLtp,
            MarketData::IndexQuote(_) => PacketType::IndexQuote,
            MarketData::IndexFull(_) => PacketType::IndexFull,
        }
    }

    pub fn security_id(&self) -> u32 {
        match self {
            MarketData::Ltp(r) => r.security_id,
            MarketData::Quote(r) => r.security_id,
            MarketData::Full(r) => r.security_id,
            MarketData::IndexLtp(r) => r.security_id,
            MarketData::IndexQuote(r) => r.security_id,
            MarketData::IndexFull(r) => r.security_id,
        }
    }

    pub fn last_price(&self) -> f32 {
        match self {
            MarketData::Ltp(r) => r.last_price,
            MarketData::Quote(r) => r.last_price,
            MarketData::Full(r) => r.last_price,
            MarketData::IndexLtp(r) => r.last_price,
            MarketData::IndexQuote(r) => r.last_price,
            MarketData::IndexFull(r) => r.last_price,
        }
    }

    /// Timestamp used to order merged snapshots, newest first.
    ///
    /// Trade-oriented variants use `last_trade_time`, IndexLTP uses
    /// `last_update_time`. IndexQuote carries no timestamp and sorts as
    /// zero; ties keep their read order under a stable sort.
    pub fn freshness_timestamp(&self) -> u32 {
        match self {
            MarketData::Ltp(r) => r.last_trade_time,
            MarketData::Quote(r) => r.last_trade_time,
            MarketData::Full(r) => r.last_trade_time,
            MarketData::IndexLtp(r) => r.last_update_time,
            MarketData::IndexQuote(_) => 0,
            MarketData::IndexFull(r) => r.last_trade_time,
        }
    }
}

impl<'de> Deserialize<'de> for MarketData {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Error;

        let value = serde_json::Value::deserialize(deserializer)?;
        let tag = value
            .get("packet_type")
            .and_then(serde_json::Value::as_u64)
            .ok_or_else(|| D::Error::custom("missing packet_type discriminant"))?;
        let packet_type = PacketType::from_u8(tag as u8)
            .ok_or_else(|| D::Error::custom(format!("unknown packet_type: {tag}")))?;

        let record = match packet_type {
            PacketType::Ltp => serde_json::from_value(value).map(MarketData::Ltp),
            PacketType::Quote => serde_json::from_value(value).map(MarketData::Quote),
            PacketType::Full => serde_json::from_value(value).map(MarketData::Full),
            PacketType::IndexLtp => serde_json::from_value(value).map(MarketData::IndexLtp),
            PacketType::IndexQuote => serde_json::from_value(value).map(MarketData::IndexQuote),
            PacketType::IndexFull => serde_json::from_value(value).map(MarketData::IndexFull),
        };
        record.map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packet_type_conversion() {
        assert_eq!(PacketType::from_u8(61), Some(PacketType::Ltp));
        assert_eq!(PacketType::from_u8(66), Some(PacketType::IndexFull));
        assert_eq!(PacketType::from_u8(60), None);
        assert_eq!(PacketType::from_u8(67), None);
    }

    #[test]
    fn test_payload_sizes() {
        assert_eq!(PacketType::Ltp.payload_size(), 22);
        assert_eq!(PacketType::Quote.payload_size(), 66);
        assert_eq!(PacketType::Full.payload_size(), 174);
        assert_eq!(PacketType::IndexLtp.payload_size(), 22);
        assert_eq!(PacketType::IndexQuote.payload_size(), 42);
        assert_eq!(PacketType::IndexFull.payload_size(), 38);
        assert_eq!(
            PacketType::Full.payload_size(),
            DEPTH_LEVELS * DEPTH_LEVEL_SIZE + QUOTE_PAYLOAD_SIZE + 8
        );
    }

    #[test]
    fn test_json_round_trip_uses_external_names() {
        let record = MarketData::Ltp(Ltp {
            packet_type: PacketType::Ltp as u8,
            security_id: 13,
            tradable: 1,
            mode: 2,
            last_price: 100.5,
            last_trade_time: 1000,
            change_absolute: 1.25,
            change_percent: 0.5,
        });

        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"packet_type\":61"));
        assert!(json.contains("\"last_price\":100.5"));
        assert!(json.contains("\"last_trade_time\":1000"));

        let back: MarketData = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_deserialize_dispatches_on_packet_type() {
        // IndexLTP shares the LTP shape apart from the time field name.
        let json = r#"{"packet_type":64,"security_id":7,"tradable":0,"mode":3,
                       "last_price":200.25,"last_update_time":2000,
                       "change_absolute":0.0,"change_percent":0.0}"#;
        let record: MarketData = serde_json::from_str(json).unwrap();
        assert_eq!(record.packet_type(), PacketType::IndexLtp);
        assert_eq!(record.freshness_timestamp(), 2000);
    }

    #[test]
    fn test_deserialize_rejects_unknown_tag() {
        let json = r#"{"packet_type":99,"security_id":1}"#;
        assert!(serde_json::from_str::<MarketData>(json).is_err());
    }

    #[test]
    fn test_freshness_timestamp_fallback() {
        let record = MarketData::IndexQuote(IndexQuote {
            packet_type: PacketType::IndexQuote as u8,
            security_id: 1,
            tradable: 0,
            mode: 1,
            last_price: 1.0,
            open: 1.0,
            close: 1.0,
            high: 1.0,
            low: 1.0,
            change_percent: 0.0,
            change_absolute: 0.0,
            week52_high: 1.0,
            week52_low: 1.0,
        });
        assert_eq!(record.freshness_timestamp(), 0);
    }
}
