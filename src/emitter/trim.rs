//! Leading-silence trim
//!
//! Optional second pass over a finished buffer: shift everything so the
//! first NoteOn lands on `start_offset`. Records before the first note are
//! floored at the offset, so relative order is kept.

use crate::events::TickEvent;

/// Shift `events` so the earliest NoteOn sits at `start_offset`.
///
/// Returns the number of ticks removed. A buffer without notes is left
/// untouched. Running the pass twice changes nothing the second time.
pub fn trim_leading_silence(events: &mut [TickEvent], start_offset: u64) -> u64 {
    let Some(shift) = events.iter().filter(|e| e.is_note_on()).map(TickEvent::tick).min() else {
        return 0;
    };
    for event in events.iter_mut() {
        let tick = event.tick_mut();
        *tick = tick.saturating_sub(shift) + start_offset;
    }
    shift
}
