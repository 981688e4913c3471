// src/main.rs
//
// Sanity run: with the `cpal` feature, plays a short tone sweep through the
// default output device; otherwise drives a host device by hand and prints
// a summary of each rendered block.

use sinegen::{GeneratorConfig, SignalGenerator};

#[cfg(feature = "cpal")]
fn main() {
    use std::{thread, time::Duration};

    use sinegen::CpalDevice;

    let mut generator = SignalGenerator::new(CpalDevice::new(), GeneratorConfig::default());

    if let Err(e) = generator.initialize() {
        eprintln!("Could not open audio output: {}", e);
        std::process::exit(1);
    }

    println!(
        "Playing on default device @ {} Hz",
        generator.device().sample_rate().unwrap_or_default()
    );

    generator.set_volume(0.2);
    generator.start();

    for frequency in [220.0, 330.0, 440.0, 660.0, 880.0] {
        generator.set_frequency(frequency);
        println!("  {} Hz", generator.get_frequency());
        thread::sleep(Duration::from_millis(400));
    }

    // Stop/start keeps the phase, so there is no click on resume
    generator.stop();
    thread::sleep(Duration::from_millis(200));
    generator.start();
    thread::sleep(Duration::from_millis(400));

    generator.release();
    println!("Done.");
}

#[cfg(not(feature = "cpal"))]
fn main() {
    use sinegen::{AudioBuffer, HostDevice};

    let sample_rate = 48_000.0;
    let block_frames = 256;

    let device = HostDevice::new();
    let stream = device.stream();
    let mut generator = SignalGenerator::new(device, GeneratorConfig::default());

    if let Err(e) = generator.initialize() {
        eprintln!("Could not initialize: {}", e);
        std::process::exit(1);
    }

    // Host audio thread would do this
    stream.about_to_start(sample_rate);
    generator.start();

    println!("Starting generator sanity test…");

    let mut data = vec![0.0_f32; block_frames * 2];
    for block in 0..4 {
        if block == 2 {
            generator.set_frequency(880.0);
        }

        let mut buffer = AudioBuffer::new(&mut data, 2);
        stream.render(&mut buffer);

        let peak = buffer.channel(0).iter().fold(0.0_f32, |m, s| m.max(s.abs()));
        println!(
            "Block {}: {} frames @ {} Hz, peak {:.3}",
            block,
            buffer.frames,
            generator.get_frequency(),
            peak
        );
    }

    generator.release();
    println!("Sanity test completed.");
}
