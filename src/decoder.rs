/// Packet decoder for the broadcast wire format
///
/// Takes a frame buffer and materializes typed records at the fixed offsets
/// the feed uses. Pure CPU work, no I/O, no shared state. Truncated payloads
/// and unknown tags are expected termination conditions, not errors: the
/// decoder returns whatever it understood and how far it got.

use crate::protocol::*;
use byteorder::{ByteOrder, LittleEndian};

pub struct Decoder;

impl Decoder {
    /// Decode a frame as back-to-back tag-prefixed packets.
    ///
    /// Returns the decoded records and the number of bytes consumed by
    /// complete packets. A truncated trailing packet or an unknown tag stops
    /// decoding; the caller can compare consumed bytes against the frame
    /// length to tell a clean end from an early stop.
    pub fn decode(buffer: &[u8]) -> (Vec<MarketData>, usize) {
        let mut records = Vec::new();
        let mut pos = 0;

        while pos < buffer.len() {
            let Some(packet_type) = PacketType::from_u8(buffer[pos]) else {
                // Bytes after an unrecognized tag cannot be re-framed.
                break;
            };

            let start = pos + 1;
            let end = start + packet_type.payload_size();
            if buffer.len() < end {
                break;
            }

            let payload = &buffer[start..end];
            let record = match packet_type {
                PacketType::Ltp => MarketData::Ltp(decode_ltp(payload)),
                PacketType::Quote => MarketData::Quote(decode_quote(payload)),
                PacketType::Full => MarketData::Full(decode_full(payload)),
                PacketType::IndexLtp => MarketData::IndexLtp(decode_index_ltp(payload)),
                PacketType::IndexQuote => MarketData::IndexQuote(decode_index_quote(payload)),
                PacketType::IndexFull => MarketData::IndexFull(decode_index_full(payload)),
            };
            records.push(record);
            pos = end;
        }

        (records, pos)
    }
}

/// LTP payload: price f32(0), trade_time u32(4), security_id u32(8),
/// tradable u8(12), mode u8(13), change_abs f32(14), change_pct f32(18).
fn decode_ltp(b: &[u8]) -> Ltp {
    Ltp {
        packet_type: PacketType::Ltp as u8,
        last_price: LittleEndian::read_f32(&b[0..4]),
        last_trade_time: LittleEndian::read_u32(&b[4..8]),
        security_id: LittleEndian::read_u32(&b[8..12]),
        tradable: b[12],
        mode: b[13],
        change_absolute: LittleEndian::read_f32(&b[14..18]),
        change_percent: LittleEndian::read_f32(&b[18..22]),
    }
}

/// Quote payload: LTP header block then traded totals, OHLC, change and
/// 52-week range (66 bytes). Also the tail layout of a Full packet.
fn decode_quote(b: &[u8]) -> Quote {
    Quote {
        packet_type: PacketType::Quote as u8,
        last_price: LittleEndian::read_f32(&b[0..4]),
        last_trade_time: LittleEndian::read_u32(&b[4..8]),
        security_id: LittleEndian::read_u32(&b[8..12]),
        tradable: b[12],
        mode: b[13],
        last_traded_quantity: LittleEndian::read_u32(&b[14..18]),
        average_traded_price: LittleEndian::read_f32(&b[18..22]),
        volume_traded: LittleEndian::read_u32(&b[22..26]),
        total_buy_quantity: LittleEndian::read_u32(&b[26..30]),
        total_sell_quantity: LittleEndian::read_u32(&b[30..34]),
        open: LittleEndian::read_f32(&b[34..38]),
        close: LittleEndian::read_f32(&b[38..42]),
        high: LittleEndian::read_f32(&b[42..46]),
        low: LittleEndian::read_f32(&b[46..50]),
        change_percent: LittleEndian::read_f32(&b[50..54]),
        change_absolute: LittleEndian::read_f32(&b[54..58]),
        week52_high: LittleEndian::read_f32(&b[58..62]),
        week52_low: LittleEndian::read_f32(&b[62..66]),
    }
}

/// Full payload: five 20-byte depth levels (100 bytes), a quote-shaped tail,
/// then oi u32 and change_oi u32 (174 bytes total).
fn decode_full(b: &[u8]) -> Full {
    let market_depth: [MarketDepth; DEPTH_LEVELS] = std::array::from_fn(|i| {
        let o = i * DEPTH_LEVEL_SIZE;
        MarketDepth {
            buy_quantity: LittleEndian::read_u32(&b[o..o + 4]),
            sell_quantity: LittleEndian::read_u32(&b[o + 4..o + 8]),
            buy_orders: LittleEndian::read_u16(&b[o + 8..o + 10]),
            sell_orders: LittleEndian::read_u16(&b[o + 10..o + 12]),
            buy_price: LittleEndian::read_f32(&b[o + 12..o + 16]),
            sell_price: LittleEndian::read_f32(&b[o + 16..o + 20]),
        }
    });

    let depth_size = DEPTH_LEVELS * DEPTH_LEVEL_SIZE;
    let q = decode_quote(&b[depth_size..depth_size + QUOTE_PAYLOAD_SIZE]);
    let oi_offset = depth_size + QUOTE_PAYLOAD_SIZE;

    Full {
        packet_type: PacketType::Full as u8,
        security_id: q.security_id,
        tradable: q.tradable,
        mode: q.mode,
        market_depth,
        last_price: q.last_price,
        last_trade_time: q.last_trade_time,
        last_traded_quantity: q.last_traded_quantity,
        average_traded_price: q.average_traded_price,
        volume_traded: q.volume_traded,
        total_buy_quantity: q.total_buy_quantity,
        total_sell_quantity: q.total_sell_quantity,
        open: q.open,
        close: q.close,
        high: q.high,
        low: q.low,
        change_percent: q.change_percent,
        change_absolute: q.change_absolute,
        week52_high: q.week52_high,
        week52_low: q.week52_low,
        oi: LittleEndian::read_u32(&b[oi_offset..oi_offset + 4]),
        change_oi: LittleEndian::read_u32(&b[oi_offset + 4..oi_offset + 8]),
    }
}

/// IndexLTP payload: same layout as LTP, but the time field is an update
/// time rather than a trade time.
fn decode_index_ltp(b: &[u8]) -> IndexLtp {
    IndexLtp {
        packet_type: PacketType::IndexLtp as u8,
        last_price: LittleEndian::read_f32(&b[0..4]),
        last_update_time: LittleEndian::read_u32(&b[4..8]),
        security_id: LittleEndian::read_u32(&b[8..12]),
        tradable: b[12],
        mode: b[13],
        change_absolute: LittleEndian::read_f32(&b[14..18]),
        change_percent: LittleEndian::read_f32(&b[18..22]),
    }
}

/// IndexQuote payload: no timestamp; security_id follows price directly.
fn decode_index_quote(b: &[u8]) -> IndexQuote {
    IndexQuote {
        packet_type: PacketType::IndexQuote as u8,
        last_price: LittleEndian::read_f32(&b[0..4]),
        security_id: LittleEndian::read_u32(&b[4..8]),
        tradable: b[8],
        mode: b[9],
        open: LittleEndian::read_f32(&b[10..14]),
        close: LittleEndian::read_f32(&b[14..18]),
        high: LittleEndian::read_f32(&b[18..22]),
        low: LittleEndian::read_f32(&b[22..26]),
        change_percent: LittleEndian::read_f32(&b[26..30]),
        change_absolute: LittleEndian::read_f32(&b[30..34]),
        week52_high: LittleEndian::read_f32(&b[34..38]),
        week52_low: LittleEndian::read_f32(&b[38..42]),
    }
}

/// IndexFull payload: IndexQuote shape minus the 52-week range, with a
/// trailing trade time.
fn decode_index_full(b: &[u8]) -> IndexFull {
    IndexFull {
        packet_type: PacketType::IndexFull as u8,
        last_price: LittleEndian::read_f32(&b[0..4]),
        security_id: LittleEndian::read_u32(&b[4..8]),
        tradable: b[8],
        mode: b[9],
        open: LittleEndian::read_f32(&b[10..14]),
        close: LittleEndian::read_f32(&b[14..18]),
        high: LittleEndian::read_f32(&b[18..22]),
        low: LittleEndian::read_f32(&b[22..26]),
        change_percent: LittleEndian::read_f32(&b[26..30]),
        change_absolute: LittleEndian::read_f32(&b[30..34]),
        last_trade_time: LittleEndian::read_u32(&b[34..38]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ltp_packet(security_id: u32, price: f32, time: u32) -> Vec<u8> {
        let mut pkt = vec![0u8; 1 + LTP_PAYLOAD_SIZE];
        pkt[0] = PacketType::Ltp as u8;
        LittleEndian::write_f32(&mut pkt[1..5], price);
        LittleEndian::write_u32(&mut pkt[5..9], time);
        LittleEndian::write_u32(&mut pkt[9..13], security_id);
        pkt[13] = 1; // tradable
        pkt[14] = 2; // mode
        LittleEndian::write_f32(&mut pkt[15..19], 0.75);
        LittleEndian::write_f32(&mut pkt[19..23], 0.5);
        pkt
    }

    #[test]
    fn test_decode_ltp_packet() {
        let pkt = ltp_packet(13, 100.5, 1000);
        let (records, consumed) = Decoder::decode(&pkt);

        assert_eq!(consumed, 23);
        assert_eq!(records.len(), 1);
        match &records[0] {
            MarketData::Ltp(ltp) => {
                assert_eq!(ltp.packet_type, 61);
                assert_eq!(ltp.security_id, 13);
                assert_eq!(ltp.last_price, 100.5);
                assert_eq!(ltp.last_trade_time, 1000);
                assert_eq!(ltp.tradable, 1);
                assert_eq!(ltp.mode, 2);
                assert_eq!(ltp.change_absolute, 0.75);
                assert_eq!(ltp.change_percent, 0.5);
            }
            other => panic!("expected LTP, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_buffer() {
        let (records, consumed) = Decoder::decode(&[]);
        assert!(records.is_empty());
        assert_eq!(consumed, 0);
    }

    #[test]
    fn test_truncated_payload_returns_prefix() {
        let mut buffer = ltp_packet(13, 100.5, 1000);
        buffer.extend_from_slice(&ltp_packet(14, 99.0, 1001)[..10]);

        let (records, consumed) = Decoder::decode(&buffer);
        assert_eq!(records.len(), 1);
        assert_eq!(consumed, 23);
    }

    #[test]
    fn test_unknown_tag_stops_decoding() {
        let mut buffer = ltp_packet(13, 100.5, 1000);
        buffer.push(99);
        buffer.extend_from_slice(&ltp_packet(14, 99.0, 1001));

        let (records, consumed) = Decoder::decode(&buffer);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].security_id(), 13);
        assert_eq!(consumed, 23);
    }

    #[test]
    fn test_tradable_and_mode_pass_through_unvalidated() {
        let mut pkt = ltp_packet(13, 100.5, 1000);
        pkt[13] = 200;
        pkt[14] = 255;
        let (records, _) = Decoder::decode(&pkt);
        match &records[0] {
            MarketData::Ltp(ltp) => {
                assert_eq!(ltp.tradable, 200);
                assert_eq!(ltp.mode, 255);
            }
            other => panic!("expected LTP, got {:?}", other),
        }
    }
}
