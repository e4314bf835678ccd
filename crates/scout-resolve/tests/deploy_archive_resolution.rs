use std::collections::HashSet;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tempfile::TempDir;
use zip::write::FileOptions;

use scout_archive::ClassLocation;
use scout_build_model::{
    DepOracle, ResourceModule, RuleKind, TargetInfo, TransitiveClosureOracle, WorkspaceSnapshot,
};
use scout_core::TargetKey;
use scout_resolve::{
    ArchiveClassResolver, FallbackClassResolver, NoRegistry, ProjectState, ResourceRegistry,
    SnapshotSlot,
};

fn key(label: &str) -> TargetKey {
    TargetKey::new(label)
}

fn write_deploy_jar(path: &Path, entries: &[&str]) {
    let mut jar = zip::ZipWriter::new(File::create(path).unwrap());
    let options = FileOptions::<()>::default().compression_method(zip::CompressionMethod::Stored);
    for entry in entries {
        jar.start_file(*entry, options).unwrap();
        jar.write_all(b"\xca\xfe\xba\xbe").unwrap();
    }
    jar.finish().unwrap();
}

struct NoFallback;

impl FallbackClassResolver for NoFallback {
    fn find_class(&self, _fqcn: &str) -> Option<ClassLocation> {
        None
    }
}

#[derive(Default)]
struct RecordingRegistry {
    registered: parking_lot::Mutex<Vec<(TargetKey, String, String)>>,
}

impl ResourceRegistry for RecordingRegistry {
    fn register_class(&self, owner: &TargetKey, class: &ClassLocation, fqcn: &str) {
        self.registered
            .lock()
            .push((owner.clone(), class.entry.clone(), fqcn.to_string()));
    }
}

/// Workspace with binaries App1 and App2 where only App1 transitively depends
/// on the resource target Lib. Only App1's deploy jar contains com.x.Foo.
#[test]
fn resolves_through_the_dependent_binary_only() {
    let tmp = TempDir::new().unwrap();
    let app1_jar = tmp.path().join("app1_deploy.jar");
    let app2_jar = tmp.path().join("app2_deploy.jar");
    write_deploy_jar(&app1_jar, &["com/x/Foo.class"]);
    write_deploy_jar(&app2_jar, &["com/y/Other.class"]);

    let slot = Arc::new(SnapshotSlot::new());
    let project = Arc::new(ProjectState::new(
        slot.clone(),
        Arc::new(TransitiveClosureOracle),
    ));
    slot.install(WorkspaceSnapshot::new(
        [
            TargetInfo::new(key("//java/com/app:app1"), RuleKind::Binary)
                .with_deps([key("//java/com/lib:lib")])
                .with_deploy_archive(&app1_jar),
            TargetInfo::new(key("//java/com/app:app2"), RuleKind::Binary)
                .with_deploy_archive(&app2_jar),
            TargetInfo::new(key("//java/com/lib:lib"), RuleKind::Library),
        ],
        [ResourceModule::new(
            "java.com.lib",
            [key("//java/com/lib:lib")],
        )],
    ));
    project.on_sync_completed();

    let registry = Arc::new(RecordingRegistry::default());
    let resolver = ArchiveClassResolver::new(
        "java.com.lib",
        project,
        Arc::new(NoFallback),
        registry.clone(),
    );

    let class = resolver.find_class("com.x.Foo").unwrap();
    assert_eq!(class.archive, app1_jar);
    assert_eq!(class.entry, "com/x/Foo.class");
    assert_eq!(class.read().unwrap().unwrap(), b"\xca\xfe\xba\xbe");

    assert_eq!(
        *registry.registered.lock(),
        [(
            key("//java/com/app:app1"),
            "com/x/Foo.class".to_string(),
            "com.x.Foo".to_string()
        )]
    );

    // App2 never contained the class and nothing else does either.
    assert!(resolver.find_class("com.x.Bar").is_none());
}

/// Two stale consumers after one sync trigger exactly one index computation.
#[test]
fn index_is_computed_once_per_generation_across_consumers() {
    struct CountingOracle {
        calls: AtomicUsize,
    }

    impl DepOracle for CountingOracle {
        fn reachable_subset(
            &self,
            snapshot: &WorkspaceSnapshot,
            source: &TargetKey,
            candidates: &HashSet<TargetKey>,
        ) -> HashSet<TargetKey> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            TransitiveClosureOracle.reachable_subset(snapshot, source, candidates)
        }
    }

    let tmp = TempDir::new().unwrap();
    let jar = tmp.path().join("app_deploy.jar");
    write_deploy_jar(&jar, &["com/a/A.class", "com/b/B.class"]);

    let slot = Arc::new(SnapshotSlot::new());
    let oracle = Arc::new(CountingOracle {
        calls: AtomicUsize::new(0),
    });
    let project = Arc::new(ProjectState::new(slot.clone(), oracle.clone()));

    let snapshot = WorkspaceSnapshot::new(
        [
            TargetInfo::new(key("//app:bin"), RuleKind::Binary)
                .with_deps([key("//lib:a"), key("//lib:b")])
                .with_deploy_archive(&jar),
            TargetInfo::new(key("//lib:a"), RuleKind::Library),
            TargetInfo::new(key("//lib:b"), RuleKind::Library),
        ],
        [
            ResourceModule::new("a", [key("//lib:a")]),
            ResourceModule::new("b", [key("//lib:b")]),
        ],
    );
    slot.install(snapshot.clone());
    project.on_sync_completed();

    let resolver_a = ArchiveClassResolver::new(
        "a",
        project.clone(),
        Arc::new(NoFallback),
        Arc::new(NoRegistry),
    );
    let resolver_b = ArchiveClassResolver::new(
        "b",
        project.clone(),
        Arc::new(NoFallback),
        Arc::new(NoRegistry),
    );

    assert!(resolver_a.find_class("com.a.A").is_some());
    assert!(resolver_b.find_class("com.b.B").is_some());
    // One binary in the workspace, one generation: one oracle query.
    assert_eq!(oracle.calls.load(Ordering::Relaxed), 1);

    // A new sync with the same graph recomputes from scratch.
    slot.install(snapshot);
    project.on_sync_completed();
    assert!(resolver_a.find_class("com.a.A").is_some());
    assert!(resolver_b.find_class("com.b.B").is_some());
    assert_eq!(oracle.calls.load(Ordering::Relaxed), 2);
}

/// The same provider serves a consistent candidate set to concurrent lookups
/// within one generation.
#[test]
fn concurrent_lookups_share_one_generation() {
    let tmp = TempDir::new().unwrap();
    let jar = tmp.path().join("app_deploy.jar");
    write_deploy_jar(&jar, &["com/x/Foo.class"]);

    let slot = Arc::new(SnapshotSlot::new());
    let project = Arc::new(ProjectState::new(
        slot.clone(),
        Arc::new(TransitiveClosureOracle),
    ));
    slot.install(WorkspaceSnapshot::new(
        [
            TargetInfo::new(key("//app:bin"), RuleKind::Binary)
                .with_deps([key("//lib:res")])
                .with_deploy_archive(&jar),
            TargetInfo::new(key("//lib:res"), RuleKind::Library),
        ],
        [ResourceModule::new("app", [key("//lib:res")])],
    ));
    project.on_sync_completed();

    let resolver = Arc::new(ArchiveClassResolver::new(
        "app",
        project,
        Arc::new(NoFallback),
        Arc::new(NoRegistry),
    ));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let resolver = resolver.clone();
        handles.push(std::thread::spawn(move || {
            for _ in 0..16 {
                assert!(resolver.find_class("com.x.Foo").is_some());
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }
}

/// Resolution before any sync has completed degrades to the fallback without
/// touching the (nonexistent) graph.
#[test]
fn no_sync_yet_uses_fallback_only() {
    let slot = Arc::new(SnapshotSlot::new());
    let project = Arc::new(ProjectState::new(
        slot.clone(),
        Arc::new(TransitiveClosureOracle),
    ));
    assert_eq!(project.generation(), 0);
    assert!(project.snapshot().is_none());
    assert!(project.reverse_deps().is_empty());

    let resolver =
        ArchiveClassResolver::new("app", project, Arc::new(NoFallback), Arc::new(NoRegistry));
    assert!(resolver.find_class("com.x.Foo").is_none());
}

/// `SnapshotSlot::clear` drops back to the "no graph data" state.
#[test]
fn cleared_snapshot_degrades_like_missing_graph_data() {
    let tmp = TempDir::new().unwrap();
    let jar = tmp.path().join("app_deploy.jar");
    write_deploy_jar(&jar, &["com/x/Foo.class"]);

    let slot = Arc::new(SnapshotSlot::new());
    let project = Arc::new(ProjectState::new(
        slot.clone(),
        Arc::new(TransitiveClosureOracle),
    ));
    slot.install(WorkspaceSnapshot::new(
        [
            TargetInfo::new(key("//app:bin"), RuleKind::Binary)
                .with_deps([key("//lib:res")])
                .with_deploy_archive(&jar),
            TargetInfo::new(key("//lib:res"), RuleKind::Library),
        ],
        [ResourceModule::new("app", [key("//lib:res")])],
    ));
    project.on_sync_completed();

    let resolver = ArchiveClassResolver::new(
        "app",
        project.clone(),
        Arc::new(NoFallback),
        Arc::new(NoRegistry),
    );
    assert!(resolver.find_class("com.x.Foo").is_some());

    slot.clear();
    project.on_sync_completed();
    assert!(resolver.find_class("com.x.Foo").is_none());
}
