//! Runtime scenarios driven through the async handle against shipped content.

use std::path::PathBuf;
use std::time::Duration;

use spell_content::ContentFactory;
use spell_core::{
    CastRequest, Faction, Position, RemovalMode, SpellEvent, SpellId, Unit, UnitId, UnitKind,
    World,
};
use spell_runtime::{Event, JsonEventLog, Runtime, RuntimeConfig, RuntimeError, Topic};

const SHADOW_WORD_PAIN: SpellId = SpellId(589);
const SUNDER_ARMOR: SpellId = SpellId(7386);

fn content() -> ContentFactory {
    ContentFactory::new(PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../spell/content/data"))
}

fn manual_config() -> RuntimeConfig {
    RuntimeConfig {
        tick_interval_ms: 0,
        seed: 7,
        ..RuntimeConfig::default()
    }
}

fn start(config: RuntimeConfig) -> Runtime {
    Runtime::builder()
        .config(config)
        .content(&content())
        .expect("shipped content loads")
        .build()
        .expect("runtime builds")
}

fn priest() -> Unit {
    Unit::new(UnitId(1), UnitKind::Player, 60, Faction::Alliance).with_health(3000)
}

fn ogre() -> Unit {
    Unit::new(UnitId(2), UnitKind::Creature, 60, Faction::Hostile)
        .with_health(5000)
        .at(Position::new(5, 0))
}

#[tokio::test]
async fn periodic_damage_ticks_and_expires_through_the_handle() {
    let runtime = start(manual_config());
    let handle = runtime.handle();
    let priest = handle.spawn_unit(priest()).await.expect("spawn");
    let ogre = handle.spawn_unit(ogre()).await.expect("spawn");
    let mut aura_rx = handle.subscribe(Topic::Aura);
    let mut combat_rx = handle.subscribe(Topic::Combat);

    let outcome = handle
        .cast(CastRequest::new(priest, SHADOW_WORD_PAIN).on(ogre))
        .await
        .expect("cast");
    assert_eq!(outcome.holders.len(), 1);
    let holders = handle.query_holders(ogre).await.expect("query");
    assert_eq!(holders.len(), 1);
    assert_eq!(holders[0].spell, SHADOW_WORD_PAIN);
    assert_eq!(holders[0].max_duration, 18_000);
    let mut applied = false;
    while let Ok(event) = aura_rx.try_recv() {
        applied |= matches!(event, Event::Spell(SpellEvent::HolderApplied { spell, .. }) if spell == SHADOW_WORD_PAIN);
    }
    assert!(applied);

    assert_eq!(handle.advance(3000).await.expect("advance"), 3000);
    let tick = loop {
        match combat_rx.try_recv().expect("combat event") {
            Event::Spell(SpellEvent::PeriodicTick { spell, amount, .. }) => break (spell, amount),
            _ => continue,
        }
    };
    assert_eq!(tick.0, SHADOW_WORD_PAIN);
    assert!(tick.1 > 0);
    let hurt = handle.query_unit(ogre).await.expect("query").expect("ogre");
    assert!(hurt.health() < 5000);

    handle.advance(15_000).await.expect("advance");
    assert!(handle.query_holders(ogre).await.expect("query").is_empty());

    drop(handle);
    runtime.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn removal_by_spell_reports_every_holder() {
    let runtime = start(manual_config());
    let handle = runtime.handle();
    let priest = handle.spawn_unit(priest()).await.expect("spawn");
    let ogre = handle.spawn_unit(ogre()).await.expect("spawn");

    for _ in 0..3 {
        handle
            .cast(CastRequest::new(priest, SUNDER_ARMOR).on(ogre))
            .await
            .expect("cast");
    }
    let holders = handle.query_holders(ogre).await.expect("query");
    assert_eq!(holders.len(), 1);
    assert_eq!(holders[0].stack_amount, 3);

    let removed = handle
        .remove_auras_by_spell(ogre, SUNDER_ARMOR, RemovalMode::Default)
        .await
        .expect("remove");
    assert_eq!(removed, 1);
    assert!(
        !handle
            .remove_holder(holders[0].id, RemovalMode::Default)
            .await
            .expect("remove")
    );
}

#[tokio::test]
async fn killing_an_unknown_unit_is_an_error() {
    let runtime = start(manual_config());
    let handle = runtime.handle();
    assert!(matches!(
        handle.kill_unit(UnitId(404), None).await,
        Err(RuntimeError::UnknownUnit(UnitId(404)))
    ));
}

#[tokio::test]
async fn death_clears_auras() {
    let runtime = start(manual_config());
    let handle = runtime.handle();
    let priest = handle.spawn_unit(priest()).await.expect("spawn");
    let ogre = handle.spawn_unit(ogre()).await.expect("spawn");
    handle
        .cast(CastRequest::new(priest, SHADOW_WORD_PAIN).on(ogre))
        .await
        .expect("cast");

    handle.kill_unit(ogre, Some(priest)).await.expect("kill");
    assert!(handle.query_holders(ogre).await.expect("query").is_empty());
}

#[tokio::test]
async fn event_log_mirrors_published_events() {
    let dir = tempfile::tempdir().expect("tempdir");
    let runtime = start(RuntimeConfig {
        event_log_dir: Some(dir.path().to_path_buf()),
        ..manual_config()
    });
    let handle = runtime.handle();
    let priest = handle.spawn_unit(priest()).await.expect("spawn");
    let ogre = handle.spawn_unit(ogre()).await.expect("spawn");
    handle
        .cast(CastRequest::new(priest, SHADOW_WORD_PAIN).on(ogre))
        .await
        .expect("cast");

    drop(handle);
    runtime.shutdown().await.expect("shutdown");

    let entries = JsonEventLog::read_all(dir.path().join(RuntimeConfig::EVENT_LOG_FILE))
        .expect("read log");
    assert!(entries.iter().any(|entry| matches!(
        entry.event,
        SpellEvent::HolderApplied { spell, .. } if spell == SHADOW_WORD_PAIN
    )));
    assert!(entries.windows(2).all(|pair| pair[0].sequence + 1 == pair[1].sequence));
}

#[tokio::test]
async fn snapshot_restores_against_the_catalog() {
    let runtime = start(manual_config());
    let handle = runtime.handle();
    let priest = handle.spawn_unit(priest()).await.expect("spawn");
    let ogre = handle.spawn_unit(ogre()).await.expect("spawn");
    handle
        .cast(CastRequest::new(priest, SHADOW_WORD_PAIN).on(ogre))
        .await
        .expect("cast");

    let bytes = handle.snapshot().await.expect("snapshot");
    let catalog = content().load_catalog().expect("catalog");
    let world = World::from_bytes(&bytes, &catalog).expect("restore");
    assert!(world.has_holder_of_spell(ogre, SHADOW_WORD_PAIN));
}

#[tokio::test]
async fn scheduled_ticker_advances_the_clock() {
    let runtime = start(RuntimeConfig {
        tick_interval_ms: 10,
        ..manual_config()
    });
    let handle = runtime.handle();
    let mut tick_rx = handle.subscribe(Topic::Tick);

    let event = tokio::time::timeout(Duration::from_secs(2), tick_rx.recv())
        .await
        .expect("tick within deadline")
        .expect("tick event");
    assert!(matches!(event, Event::Tick(tick) if tick.elapsed_ms == 10 && tick.clock_ms >= 10));
}

#[tokio::test]
async fn despawned_units_leave_the_world() {
    let runtime = start(manual_config());
    let handle = runtime.handle();
    let priest = handle.spawn_unit(priest()).await.expect("spawn");
    let ogre = handle.spawn_unit(ogre()).await.expect("spawn");
    handle
        .cast(CastRequest::new(priest, SHADOW_WORD_PAIN).on(ogre))
        .await
        .expect("cast");

    handle.despawn_unit(ogre).await.expect("despawn");
    assert!(handle.query_unit(ogre).await.expect("query").is_none());
    assert!(handle.query_holders(ogre).await.expect("query").is_empty());
    assert!(matches!(
        handle.despawn_unit(ogre).await,
        Err(RuntimeError::Engine(_))
    ));
}
