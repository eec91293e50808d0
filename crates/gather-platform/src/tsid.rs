//! TSID Generation
//!
//! Time-sorted identifiers rendered as 13-character Crockford Base32
//! strings. Lexicographic order matches creation order, which keeps
//! `_id`-sorted scans in insertion order without a separate timestamp
//! index.

use rand::Rng;
use std::sync::Mutex;

/// Custom epoch: 2020-01-01T00:00:00Z in milliseconds.
const TSID_EPOCH_MS: i64 = 1_577_836_800_000;

/// Bits reserved for the per-millisecond sequence.
const SEQUENCE_BITS: u32 = 22;
const SEQUENCE_MASK: u64 = (1 << SEQUENCE_BITS) - 1;

const CROCKFORD_ALPHABET: &[u8; 32] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";

static STATE: Mutex<GeneratorState> = Mutex::new(GeneratorState { last_ms: 0, sequence: 0 });

struct GeneratorState {
    last_ms: i64,
    sequence: u64,
}

pub struct TsidGenerator;

impl TsidGenerator {
    /// Generate a new TSID.
    ///
    /// The value packs a 42-bit millisecond timestamp above a 22-bit
    /// sequence. Within a single millisecond the sequence increments,
    /// so IDs never repeat even under burst generation.
    pub fn generate() -> String {
        let now_ms = chrono::Utc::now().timestamp_millis() - TSID_EPOCH_MS;

        let value = {
            let mut state = STATE.lock().unwrap_or_else(|e| e.into_inner());
            if now_ms > state.last_ms {
                state.last_ms = now_ms;
                // Random starting point leaves headroom before wrap.
                state.sequence = rand::thread_rng().gen_range(0..(SEQUENCE_MASK / 2));
            } else {
                state.sequence += 1;
                if state.sequence > SEQUENCE_MASK {
                    // Sequence exhausted within one millisecond; borrow the next.
                    state.last_ms += 1;
                    state.sequence = 0;
                }
            }
            ((state.last_ms as u64) << SEQUENCE_BITS) | state.sequence
        };

        Self::encode(value)
    }

    fn encode(value: u64) -> String {
        let mut out = [0u8; 13];
        for (i, slot) in out.iter_mut().enumerate() {
            let shift = 5 * (12 - i);
            let index = if shift >= 64 {
                0
            } else {
                ((value >> shift) & 0x1F) as usize
            };
            *slot = CROCKFORD_ALPHABET[index];
        }
        String::from_utf8_lossy(&out).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn generated_ids_are_13_crockford_chars() {
        let id = TsidGenerator::generate();
        assert_eq!(id.len(), 13);
        assert!(id.chars().all(|c| {
            matches!(c, '0'..='9' | 'A'..='H' | 'J'..='K' | 'M'..='N' | 'P'..='T' | 'V'..='Z')
        }));
    }

    #[test]
    fn burst_generation_is_unique() {
        let ids: HashSet<String> = (0..1000).map(|_| TsidGenerator::generate()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn later_ids_sort_after_earlier_ones() {
        let id1 = TsidGenerator::generate();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let id2 = TsidGenerator::generate();
        assert!(id2 > id1, "id2 ({}) should be greater than id1 ({})", id2, id1);
    }
}
