use anyhow::Result;
use earshot::*;
use std::sync::Arc;

/// Walks two listeners through a street full of buskers and prints what
/// each of them is sent.
fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Debug)
        .init();

    let zone = Arc::new(RadiusZone::new());
    let (sink, transmissions) = ChannelSink::new();
    let services = HearingServices {
        zone: zone.clone(),
        dispatcher: Arc::new(EventDispatcher::new()),
        sink: Arc::new(sink),
    };
    let config = HearingConfig::new().channel_range(1, 8).hearing_range(6.0);
    let mut world = HearingWorld::new(config, services)?;

    let buskers: Vec<Arc<SoundEmitter>> = (0..12)
        .map(|i| {
            let busker = SoundEmitter::new(Vec3::new(i as f32 * 4.0, 0.0, 0.0));
            if i % 3 != 0 {
                busker.play(
                    SoundDescriptor::new(format!("sound/street/busker_{}.ogg", i), 60.0)
                        .repeating(true),
                );
            }
            zone.add_emitter(busker.clone());
            busker
        })
        .collect();

    let walker = Body::new(Vec3::ZERO);
    let stroller = Body::new(Vec3::new(44.0, 0.0, 0.0));
    stroller.set_terrain_coefficient(0.7);

    let (alice, bob) = (OwnerId::new(), OwnerId::new());
    world.attach(alice, walker.clone())?;
    world.attach(bob, stroller.clone())?;

    for tick in 0..12 {
        walker.set_position(Vec3::new(tick as f32 * 4.0, 0.0, 0.0));
        stroller.set_position(Vec3::new(44.0 - tick as f32 * 4.0, 0.0, 0.0));

        // Idle buskers strike up as the walker reaches them.
        if let Some(busker) = buskers.get(tick).filter(|b| !b.is_playing()) {
            busker.play(SoundDescriptor::new("sound/street/fiddle.ogg", 70.0));
            let handle: EmitterHandle = busker.clone();
            world
                .dispatcher()
                .publish(EmitterEvent::Started { emitter: handle });
        }

        zone.refresh();
        let handled = world.pump();
        log::info!("tick {}: {} messages handled", tick, handled);

        for transmission in transmissions.try_iter() {
            let who = if transmission.owner == alice { "alice" } else { "bob" };
            let sound = &transmission.sound;
            match (sound.file(), sound.channel()) {
                (None, Some(channel)) => println!("  {} silence {}", who, channel),
                (Some(file), channel) => println!(
                    "  {} {:?} {} at {:.1} on {:?}",
                    who,
                    sound.mode(),
                    file,
                    sound.volume(),
                    channel
                ),
                (None, None) => {}
            }
        }
    }

    for (name, owner) in [("alice", alice), ("bob", bob)] {
        if let Some(stats) = world.detach(owner) {
            println!("{}: {:?}", name, stats);
        }
    }

    Ok(())
}
