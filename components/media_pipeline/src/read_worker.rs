//! Reader worker cycle (spec.md §4.5 "Reader loop")

use crate::command::CommandCoordinator;
use crate::flags::PipelineFlags;
use mediacore_component::ComponentSet;
use mediacore_types::{MediaContainer, MediaPacket, MediaType, PacketOrEndOfStream, ReadError, Ticks};
use parking_lot::Mutex;
use std::time::Duration;

/// Facts produced by one [`ReadWorker::run_cycle`] call. Carries no
/// `EngineState`/`Connector` reference — those belong to the engine crate,
/// which drives the loop and reacts to these facts.
#[derive(Debug, Default, Clone)]
pub struct ReadCycleOutcome {
    /// A packet was read and routed to a component this cycle.
    pub packet_routed: bool,
    /// The container reported end of stream this cycle.
    pub hit_end_of_stream: bool,
    /// A transient read error occurred (logged, never fatal by itself).
    pub error: Option<ReadError>,
    /// True if the caller should back off before the next cycle: nothing
    /// was read, or reads are currently aborted/exhausted.
    pub should_back_off: bool,
}

/// Drives one iteration of the reader loop: read the next packet and route
/// it to its owning component, or signal end of stream.
pub struct ReadWorker;

impl ReadWorker {
    /// Runs one reader cycle.
    pub fn run_cycle(
        container: &Mutex<Box<dyn MediaContainer>>,
        components: &Mutex<ComponentSet>,
        flags: &PipelineFlags,
        coordinator: &CommandCoordinator,
    ) -> ReadCycleOutcome {
        coordinator.read_gate().begin();
        let outcome = Self::run_cycle_inner(container, components, flags);
        coordinator.read_gate().end();
        outcome
    }

    fn run_cycle_inner(
        container: &Mutex<Box<dyn MediaContainer>>,
        components: &Mutex<ComponentSet>,
        flags: &PipelineFlags,
    ) -> ReadCycleOutcome {
        let mut outcome = ReadCycleOutcome::default();

        if !Self::can_read_more(flags) {
            outcome.should_back_off = true;
            return outcome;
        }

        let packet_or_eof = {
            let mut container = container.lock();
            container.read()
        };

        match packet_or_eof {
            Ok(PacketOrEndOfStream::EndOfStream) => {
                flags.set_at_eof(true);
                let components = components.lock();
                for media_type in MediaType::KNOWN {
                    if let Some(component) = components.get(media_type) {
                        component.set_eof_reached(true);
                        component.send_packet(MediaPacket::empty(component.stream_index(), media_type));
                    }
                }
                outcome.hit_end_of_stream = true;
            }
            Ok(PacketOrEndOfStream::Packet(packet)) => {
                let components = components.lock();
                if let Some(component) = components.get(packet.media_type) {
                    if component.stream_index() == packet.stream_index {
                        component.send_packet(packet);
                        outcome.packet_routed = true;
                    }
                }
                // Packets for streams not selected into the component set
                // are silently dropped (spec.md §4.2 "exactly one component
                // per selected stream").
            }
            Err(error) => {
                outcome.error = Some(error);
                outcome.should_back_off = true;
            }
        }

        outcome
    }

    /// True unless reads have been aborted or the container is already
    /// known to be exhausted.
    fn can_read_more(flags: &PipelineFlags) -> bool {
        !flags.is_read_aborted() && !flags.is_at_eof()
    }

    /// Pacing contract (spec.md §4.5): whether the reader should fetch more
    /// packets given the combined audio/video buffered duration, relative
    /// to the tuning-derived download cache length. Live sources always
    /// read as fast as they can.
    pub fn should_read_more(is_live: bool, buffer_length: Ticks, download_cache_length: Duration) -> bool {
        is_live || buffer_length < Ticks::from_secs_f64(download_cache_length.as_secs_f64())
    }
}
