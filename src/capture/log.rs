//! Append-only, sequence-numbered event log with cursor reads

use parking_lot::Mutex;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// An event stamped with its position in the log and its capture time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Captured<E> {
    pub sequence: u64,
    pub timestamp_micros: u64,
    #[serde(flatten)]
    pub event: E,
}

/// Result of a cursor read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Batch<E> {
    pub events: Vec<Captured<E>>,
    pub next_cursor: u64,
}

/// Sequence numbers start at 1 and grow by exactly 1 per append, so the
/// event with sequence `n` lives at index `n - 1`.
///
/// Entries sit in a `boxcar::Vec`, which never moves an element once pushed.
/// Readers take no lock: they load the published length and clone entries
/// below it. The writer lock only orders appends against each other, so the
/// hook callback never waits on a reader.
pub struct EventLog<E> {
    entries: boxcar::Vec<Captured<E>>,
    /// Number of entries fully pushed and visible to readers.
    published: AtomicU64,
    /// Timestamp of the last append, held for the whole append.
    writer: Mutex<u64>,
}

impl<E: Clone> EventLog<E> {
    pub fn new() -> Self {
        Self {
            entries: boxcar::Vec::new(),
            published: AtomicU64::new(0),
            writer: Mutex::new(0),
        }
    }

    /// Append an event and return its sequence number.
    ///
    /// Only the hook callback appends. Timestamps are clamped to the previous
    /// entry so they never decrease.
    pub(crate) fn append(&self, timestamp_micros: u64, event: E) -> u64 {
        let mut last_timestamp = self.writer.lock();
        let sequence = self.published.load(Ordering::Relaxed) + 1;
        let timestamp_micros = (*last_timestamp).max(timestamp_micros);

        self.entries.push(Captured {
            sequence,
            timestamp_micros,
            event,
        });
        *last_timestamp = timestamp_micros;
        self.published.store(sequence, Ordering::Release);
        sequence
    }

    /// All events with a sequence number greater than `cursor`.
    ///
    /// A cursor past the end yields an empty batch whose `next_cursor` is the
    /// last assigned sequence number.
    pub fn read(&self, cursor: u64) -> Batch<E> {
        let last = self.last_sequence();

        if cursor >= last {
            return Batch {
                events: Vec::new(),
                next_cursor: last,
            };
        }

        let events = (cursor..last)
            .filter_map(|index| self.entries.get(index as usize).cloned())
            .collect();

        Batch {
            events,
            next_cursor: last,
        }
    }

    pub fn last_sequence(&self) -> u64 {
        self.published.load(Ordering::Acquire)
    }
}

impl<E: Clone> Default for EventLog<E> {
    fn default() -> Self {
        Self::new()
    }
}

pub fn micros_since_epoch(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_micros() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;
    use std::sync::{mpsc, Arc};
    use std::thread;
    use std::time::{Duration, Instant};

    #[test]
    fn read_from_zero_returns_everything_in_order() {
        let log = EventLog::new();
        for n in 0..5 {
            log.append(100 + n, n);
        }

        let batch = log.read(0);

        assert_eq!(batch.events.len(), 5);
        assert_eq!(
            batch.events.iter().map(|e| e.sequence).collect::<Vec<_>>(),
            vec![1, 2, 3, 4, 5]
        );
        assert_eq!(
            batch.events.iter().map(|e| e.event).collect::<Vec<_>>(),
            vec![0, 1, 2, 3, 4]
        );
        assert_eq!(batch.next_cursor, 5);
    }

    #[test]
    fn rereading_next_cursor_is_an_empty_no_op() {
        let log = EventLog::new();
        log.append(1, 'a');
        log.append(2, 'b');

        let first = log.read(0);
        let second = log.read(first.next_cursor);
        let third = log.read(second.next_cursor);

        assert!(second.events.is_empty());
        assert_eq!(second.next_cursor, first.next_cursor);
        assert_eq!(second, third);
    }

    #[test]
    fn incremental_reads_neither_lose_nor_duplicate() {
        let log = EventLog::new();
        log.append(1, "one");
        log.append(2, "two");
        let first = log.read(0);

        log.append(3, "three");
        log.append(4, "four");
        log.append(5, "five");
        let second = log.read(first.next_cursor);

        assert_eq!(
            second.events.iter().map(|e| e.event).collect::<Vec<_>>(),
            vec!["three", "four", "five"]
        );
        assert_eq!(second.events[0].sequence, 3);
        assert_eq!(second.next_cursor, 5);
    }

    #[test]
    fn empty_log_reads_cursor_zero() {
        let log: EventLog<u8> = EventLog::new();

        let batch = log.read(0);

        assert!(batch.events.is_empty());
        assert_eq!(batch.next_cursor, 0);
    }

    #[test]
    fn cursor_past_the_end_clamps_to_last_sequence() {
        let log = EventLog::new();
        log.append(1, ());
        log.append(2, ());

        let batch = log.read(40);

        assert!(batch.events.is_empty());
        assert_eq!(batch.next_cursor, 2);
    }

    #[test]
    fn timestamps_never_decrease() {
        let log = EventLog::new();
        log.append(500, 1);
        log.append(300, 2);
        log.append(700, 3);

        let stamps: Vec<u64> = log.read(0).events.iter().map(|e| e.timestamp_micros).collect();

        assert_eq!(stamps, vec![500, 500, 700]);
    }

    #[test]
    fn concurrent_readers_see_a_gapless_prefix() {
        let log = Arc::new(EventLog::new());
        let writer = {
            let log = Arc::clone(&log);
            thread::spawn(move || {
                for n in 0..2000u64 {
                    log.append(n, n);
                }
            })
        };

        let mut cursor = 0;
        let mut seen = Vec::new();
        while seen.len() < 2000 {
            let batch = log.read(cursor);
            for (offset, event) in batch.events.iter().enumerate() {
                assert_eq!(event.sequence, cursor + offset as u64 + 1);
            }
            seen.extend(batch.events.into_iter().map(|e| e.event));
            cursor = batch.next_cursor;
        }
        writer.join().unwrap();

        assert_eq!(seen, (0..2000).collect::<Vec<_>>());
    }

    /// Cloning the first copy of this event parks the reader mid-read until
    /// the writer reports a finished append or the timeout expires.
    struct Gate {
        entered: parking_lot::Mutex<Option<mpsc::Sender<()>>>,
        appended: parking_lot::Mutex<mpsc::Receiver<()>>,
        saw_append: AtomicBool,
    }

    struct Slow(Arc<Gate>);

    impl Clone for Slow {
        fn clone(&self) -> Self {
            let entered = self.0.entered.lock().take();
            if let Some(entered) = entered {
                entered.send(()).unwrap();
                let appended = self
                    .0
                    .appended
                    .lock()
                    .recv_timeout(Duration::from_secs(5))
                    .is_ok();
                self.0.saw_append.store(appended, Ordering::SeqCst);
            }
            Slow(Arc::clone(&self.0))
        }
    }

    #[test]
    fn append_does_not_wait_for_a_read_in_progress() {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (appended_tx, appended_rx) = mpsc::channel();
        let gate = Arc::new(Gate {
            entered: parking_lot::Mutex::new(Some(entered_tx)),
            appended: parking_lot::Mutex::new(appended_rx),
            saw_append: AtomicBool::new(false),
        });
        let log = Arc::new(EventLog::new());
        for n in 0..50_000 {
            log.append(n, Slow(Arc::clone(&gate)));
        }

        let reader = {
            let log = Arc::clone(&log);
            thread::spawn(move || log.read(0).events.len())
        };
        entered_rx.recv().unwrap();

        let started = Instant::now();
        let sequence = log.append(50_000, Slow(Arc::clone(&gate)));
        let elapsed = started.elapsed();
        appended_tx.send(()).unwrap();

        assert_eq!(reader.join().unwrap(), 50_000);
        assert!(gate.saw_append.load(Ordering::SeqCst));
        assert!(elapsed < Duration::from_secs(1), "append took {:?}", elapsed);
        assert_eq!(sequence, 50_001);
        assert_eq!(log.last_sequence(), 50_001);
    }

    #[test]
    fn captured_event_flattens_payload() {
        #[derive(Clone, Serialize)]
        struct Payload {
            key: &'static str,
        }

        let log = EventLog::new();
        log.append(42, Payload { key: "a" });
        let value = serde_json::to_value(&log.read(0)).unwrap();

        assert_eq!(
            value,
            serde_json::json!({
                "events": [{"sequence": 1, "timestamp_micros": 42, "key": "a"}],
                "next_cursor": 1
            })
        );
    }
}
