use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use spell_content::{
    BookRecord, DebounceConfig, EffectRecord, FormId, PluginConfig, SpellRecord, WorldData,
};
use spell_progress::{
    CatalogEvent, DisplayNameSink, Event, InMemoryContent, InMemoryScriptVm, IngestOutcome,
    ProgressEvent, ServiceError, SpellProgressService, Topic,
};

const PACKAGE: &str = "ForgottenMagic_Redone.esp";
const FIREBLAST: FormId = FormId(0x0100_0D62);
const FIREBLAST_EFFECT: FormId = FormId(0x0100_0D63);
const ICE_LANCE: FormId = FormId(0x0100_0E10);
const ICE_LANCE_EFFECT: FormId = FormId(0x0100_0E11);

fn world() -> WorldData {
    WorldData {
        packages: vec!["Skyrim.esm".into(), PACKAGE.into()],
        spells: vec![
            SpellRecord {
                id: FIREBLAST,
                name: "Fireblast".into(),
                package: PACKAGE.into(),
                effects: vec![FIREBLAST_EFFECT],
            },
            SpellRecord {
                id: ICE_LANCE,
                name: "Ice Lance".into(),
                package: PACKAGE.into(),
                effects: vec![ICE_LANCE_EFFECT],
            },
        ],
        books: vec![
            BookRecord {
                id: FormId(0x0100_1000),
                name: "Spell Tome: Fireblast".into(),
                package: PACKAGE.into(),
                teaches: Some(FIREBLAST),
            },
            BookRecord {
                id: FormId(0x0100_1001),
                name: "Spell Tome: Ice Lance".into(),
                package: PACKAGE.into(),
                teaches: Some(ICE_LANCE),
            },
        ],
        effects: vec![
            EffectRecord {
                id: FIREBLAST_EFFECT,
                name: "Fireblast".into(),
                package: PACKAGE.into(),
            },
            EffectRecord {
                id: ICE_LANCE_EFFECT,
                name: "Ice Lance".into(),
                package: PACKAGE.into(),
            },
        ],
        ..WorldData::default()
    }
}

fn config(idle_threshold_ms: u64) -> PluginConfig {
    let mut config = PluginConfig::default();
    config.debounce = DebounceConfig {
        idle_threshold_ms,
        poll_interval_ms: 10,
    };
    config.spell_indices.insert("Spell Tome: Fireblast".into(), 0);
    config.spell_indices.insert("Spell Tome: Ice Lance".into(), 1);
    config
}

struct Harness {
    service: SpellProgressService,
    content: Arc<InMemoryContent>,
    vm: Arc<InMemoryScriptVm>,
}

impl Harness {
    fn new() -> Self {
        Self::with_idle_threshold(50)
    }

    fn with_idle_threshold(idle_threshold_ms: u64) -> Self {
        let content = Arc::new(InMemoryContent::from_world(&world()));
        let vm = Arc::new(InMemoryScriptVm::new());
        vm.set_float("vMCM", "vMCMscript", "fSPXP", 0, 0.0);
        vm.set_float("vMCM", "vMCMscript", "fSPXP", 1, 0.0);
        vm.set_float("vMCM", "vMCMscript", "fXPreq", 0, 100.0);
        vm.set_float("vMCM", "vMCMscript", "fXPreq", 1, 100.0);

        let service = SpellProgressService::builder()
            .config(config(idle_threshold_ms))
            .content(content.clone())
            .sink(content.clone())
            .script_vm(vm.clone())
            .build()
            .expect("service should build");

        Self {
            service,
            content,
            vm,
        }
    }

    fn set_xp(&self, index: usize, current: f32) {
        self.vm.set_float("vMCM", "vMCMscript", "fSPXP", index, current);
    }

    fn name(&self, spell: FormId) -> String {
        self.content.display_name(spell).unwrap_or_default()
    }

    fn wait_for_name(&self, spell: FormId, expected: &str) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while self.name(spell) != expected && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(self.name(spell), expected);
    }
}

#[test]
fn test_cast_updates_name_after_idle_threshold() {
    let harness = Harness::new();
    let result = harness.service.on_data_loaded().expect("catalog should load");
    assert!(result.package_found);
    assert_eq!(result.matched, 2);

    harness.service.start().expect("service should start");
    harness.set_xp(0, 25.0);

    let ingest = harness.service.ingest();
    assert_eq!(
        ingest.on_effect_applied(FIREBLAST_EFFECT, Some(true)),
        IngestOutcome::Queued(FIREBLAST)
    );

    harness.wait_for_name(FIREBLAST, "Fireblast (25%)");
    assert_eq!(harness.name(ICE_LANCE), "Ice Lance");

    let started = Instant::now();
    harness.service.stop().expect("service should stop");
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[test]
fn test_burst_of_casts_produces_one_batch() {
    let harness = Harness::with_idle_threshold(300);
    harness.service.on_data_loaded().unwrap();
    harness.service.start().unwrap();
    harness.set_xp(1, 40.0);

    let ingest = harness.service.ingest();
    for _ in 0..5 {
        ingest.on_effect_applied(ICE_LANCE_EFFECT, Some(true));
        thread::sleep(Duration::from_millis(10));
    }

    harness.wait_for_name(ICE_LANCE, "Ice Lance (40%)");
    thread::sleep(Duration::from_millis(50));
    assert_eq!(harness.service.metrics().batches_processed(), 1);
    harness.service.stop().unwrap();
}

#[test]
fn test_casts_from_other_actors_are_ignored() {
    let harness = Harness::new();
    harness.service.on_data_loaded().unwrap();
    harness.service.start().unwrap();
    harness.set_xp(0, 80.0);

    let ingest = harness.service.ingest();
    for _ in 0..3 {
        assert!(matches!(
            ingest.on_effect_applied(FIREBLAST_EFFECT, Some(false)),
            IngestOutcome::Ignored(_)
        ));
    }

    thread::sleep(Duration::from_millis(150));
    assert_eq!(harness.name(FIREBLAST), "Fireblast");
    assert_eq!(harness.content.name_writes(), 0);
    harness.service.stop().unwrap();
}

#[test]
fn test_hotkey_refreshes_every_tracked_spell() {
    let harness = Harness::new();
    harness.service.on_data_loaded().unwrap();
    harness.service.start().unwrap();
    harness.set_xp(0, 10.0);
    harness.set_xp(1, 99.6);

    assert!(harness.service.hotkey().on_button(0x3A, Instant::now()));

    harness.wait_for_name(FIREBLAST, "Fireblast (10%)");
    harness.wait_for_name(ICE_LANCE, "Ice Lance (100%)");
    harness.service.stop().unwrap();
}

#[test]
fn test_missing_controller_leaves_names_untouched() {
    let harness = Harness::new();
    harness.service.on_data_loaded().unwrap();
    harness.vm.remove_controller("vMCM");
    harness.service.start().unwrap();

    harness
        .service
        .ingest()
        .on_effect_applied(FIREBLAST_EFFECT, Some(true));

    let deadline = Instant::now() + Duration::from_secs(5);
    while harness.service.metrics().batches_aborted() == 0 && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(5));
    }
    assert_eq!(harness.service.metrics().batches_aborted(), 1);
    assert_eq!(harness.name(FIREBLAST), "Fireblast");
    harness.service.stop().unwrap();
}

#[test]
fn test_new_game_restores_original_names() {
    let harness = Harness::new();
    harness.service.on_data_loaded().unwrap();
    harness.service.start().unwrap();
    harness.set_xp(0, 50.0);

    harness
        .service
        .ingest()
        .on_effect_applied(FIREBLAST_EFFECT, Some(true));
    harness.wait_for_name(FIREBLAST, "Fireblast (50%)");

    let result = harness.service.on_new_game().unwrap();
    assert_eq!(result.matched, 2);
    assert_eq!(harness.name(FIREBLAST), "Fireblast");

    let catalog = harness.service.catalog().unwrap();
    assert_eq!(
        catalog.get(FIREBLAST).map(|t| t.original_name.as_str()),
        Some("Fireblast")
    );

    harness.service.on_post_load_game().unwrap();
    assert_eq!(harness.name(FIREBLAST), "Fireblast");
    harness.service.stop().unwrap();
}

/// Sink whose writes can be slowed down after setup.
struct SlowSink {
    inner: Arc<InMemoryContent>,
    delay_ms: AtomicU64,
}

impl DisplayNameSink for SlowSink {
    fn display_name(&self, form: FormId) -> Option<String> {
        self.inner.display_name(form)
    }

    fn set_display_name(&self, form: FormId, name: &str) {
        thread::sleep(Duration::from_millis(self.delay_ms.load(Ordering::SeqCst)));
        self.inner.set_display_name(form, name);
    }
}

#[test]
fn test_ingest_does_not_wait_for_catalog_reload() {
    let content = Arc::new(InMemoryContent::from_world(&world()));
    let sink = Arc::new(SlowSink {
        inner: content.clone(),
        delay_ms: AtomicU64::new(0),
    });
    let vm = Arc::new(InMemoryScriptVm::new());
    vm.set_float("vMCM", "vMCMscript", "fSPXP", 0, 50.0);
    vm.set_float("vMCM", "vMCMscript", "fXPreq", 0, 100.0);

    let service = SpellProgressService::builder()
        .config(config(50))
        .content(content.clone())
        .sink(sink.clone())
        .script_vm(vm)
        .build()
        .unwrap();
    service.on_data_loaded().unwrap();
    service.start().unwrap();

    let ingest = service.ingest();
    ingest.on_effect_applied(FIREBLAST_EFFECT, Some(true));
    let deadline = Instant::now() + Duration::from_secs(5);
    while content.display_name(FIREBLAST).as_deref() != Some("Fireblast (50%)")
        && Instant::now() < deadline
    {
        thread::sleep(Duration::from_millis(5));
    }
    assert_eq!(content.display_name(FIREBLAST).as_deref(), Some("Fireblast (50%)"));

    sink.delay_ms.store(300, Ordering::SeqCst);
    let (elapsed, outcome) = thread::scope(|scope| {
        let reload = scope.spawn(|| service.on_new_game());
        thread::sleep(Duration::from_millis(50));

        let started = Instant::now();
        let outcome = ingest.on_effect_applied(ICE_LANCE_EFFECT, Some(true));
        let elapsed = started.elapsed();

        reload.join().unwrap().unwrap();
        (elapsed, outcome)
    });

    assert_eq!(outcome, IngestOutcome::Queued(ICE_LANCE));
    assert!(elapsed < Duration::from_millis(150), "ingest took {elapsed:?}");
    assert_eq!(content.display_name(FIREBLAST).as_deref(), Some("Fireblast"));

    sink.delay_ms.store(0, Ordering::SeqCst);
    service.stop().unwrap();
}

#[test]
fn test_unmatched_catalog_never_writes_names() {
    let content = Arc::new(InMemoryContent::from_world(&world()));
    let vm = Arc::new(InMemoryScriptVm::new());
    vm.set_float("vMCM", "vMCMscript", "fSPXP", 0, 50.0);
    vm.set_float("vMCM", "vMCMscript", "fXPreq", 0, 100.0);

    let mut config = config(20);
    config.spell_indices.clear();
    config.spell_indices.insert("Spell Tome: Meteor Storm".into(), 0);

    let service = SpellProgressService::builder()
        .config(config)
        .content(content.clone())
        .sink(content.clone())
        .script_vm(vm)
        .build()
        .unwrap();

    let result = service.on_data_loaded().unwrap();
    assert!(result.package_found);
    assert_eq!(result.matched, 0);
    service.start().unwrap();

    let ingest = service.ingest();
    for effect in [FIREBLAST_EFFECT, ICE_LANCE_EFFECT] {
        assert!(matches!(
            ingest.on_effect_applied(effect, Some(true)),
            IngestOutcome::Ignored(_)
        ));
    }
    assert!(service.hotkey().on_button(0x3A, Instant::now()));

    thread::sleep(Duration::from_millis(100));
    assert_eq!(service.pending(), 0);
    assert_eq!(service.metrics().batches_processed(), 0);
    assert_eq!(content.name_writes(), 0);
    service.stop().unwrap();
}

#[test]
fn test_peak_pending_depth_counts_burst() {
    let harness = Harness::with_idle_threshold(300);
    harness.service.on_data_loaded().unwrap();
    harness.service.start().unwrap();
    harness.set_xp(0, 20.0);
    harness.set_xp(1, 40.0);

    let ingest = harness.service.ingest();
    ingest.on_effect_applied(FIREBLAST_EFFECT, Some(true));
    ingest.on_effect_applied(ICE_LANCE_EFFECT, Some(true));

    harness.wait_for_name(FIREBLAST, "Fireblast (20%)");
    harness.wait_for_name(ICE_LANCE, "Ice Lance (40%)");
    assert_eq!(harness.service.metrics().peak_pending_depth(), 2);
    harness.service.stop().unwrap();
}

#[test]
fn test_start_twice_is_rejected() {
    let harness = Harness::new();
    harness.service.start().unwrap();
    assert!(matches!(
        harness.service.start(),
        Err(ServiceError::AlreadyRunning)
    ));
    harness.service.stop().unwrap();
}

#[test]
fn test_events_after_stop_are_ignored() {
    let harness = Harness::new();
    harness.service.on_data_loaded().unwrap();
    harness.service.start().unwrap();
    harness.service.stop().unwrap();

    harness.set_xp(0, 30.0);
    let outcome = harness
        .service
        .ingest()
        .on_effect_applied(FIREBLAST_EFFECT, Some(true));

    assert!(matches!(outcome, IngestOutcome::Ignored(_)));
    assert_eq!(harness.name(FIREBLAST), "Fireblast");
}

#[tokio::test]
async fn test_observer_receives_progress_events() {
    let harness = Harness::new();
    let mut catalog_events = harness.service.subscribe(Topic::Catalog);
    let mut progress_events = harness.service.subscribe(Topic::Progress);

    harness.service.on_data_loaded().unwrap();
    let loaded = loop {
        match catalog_events.recv().await.unwrap() {
            Event::Catalog(CatalogEvent::Loaded { matched, .. }) => break matched,
            _ => continue,
        }
    };
    assert_eq!(loaded, 2);

    harness.service.start().unwrap();
    harness.set_xp(0, 75.0);
    harness
        .service
        .ingest()
        .on_effect_applied(FIREBLAST_EFFECT, Some(true));

    let updated = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if let Event::Progress(ProgressEvent::SpellUpdated { spell, name, percent }) =
                progress_events.recv().await.unwrap()
            {
                break (spell, name, percent);
            }
        }
    })
    .await
    .expect("SpellUpdated should arrive");

    assert_eq!(updated, (FIREBLAST, "Fireblast (75%)".to_string(), 75));
    harness.service.stop().unwrap();
}
