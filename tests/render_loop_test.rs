//! Render loop scheduling against a real window and device.
//!
//! The loop never stops on its own, every presented frame schedules the
//! next redraw. These tests cap it with a frame limit and need a display
//! plus a GPU adapter, so they only run with the `integration-tests`
//! feature enabled.

#![cfg(feature = "integration-tests")]

use std::sync::atomic::Ordering;

use rackview::MachineRoom;

#[test]
fn render_loop_reschedules_until_the_frame_cap() {
    let mut room = MachineRoom::new("./models/");
    let rendered = room.limit_frames(3);
    room.run().expect("Event loop failed");
    assert_eq!(rendered.load(Ordering::SeqCst), 3);
}
