fn main() {
    println!("Run `cargo test -p pipeline-compat` to execute pipeline compatibility tests.");
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;
    use std::sync::Arc;

    use launchpad_actions::{BuildContext, PipelineFile, ReleaseSettings, Services, UploadContext};
    use launchpad_task::PipelineError;

    /// Returns the path to the fixtures directory.
    fn fixtures_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    fn read_fixture(name: &str) -> String {
        let path = fixtures_dir().join(name);
        fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()))
    }

    fn load_json(name: &str) -> serde_json::Value {
        serde_json::from_str(&read_fixture(name))
            .unwrap_or_else(|e| panic!("failed to parse fixture {name}: {e}"))
    }

    fn contexts() -> (BuildContext, UploadContext) {
        let settings: ReleaseSettings = serde_json::from_value(load_json("settings.json"))
            .unwrap_or_else(|e| panic!("failed to parse settings fixture: {e}"));
        let services = Arc::new(Services::new(settings).unwrap());
        (
            BuildContext::new(Arc::clone(&services), "/tmp/build", "/tmp/out", "1.0.0"),
            UploadContext::new(services, "1.0.0"),
        )
    }

    /// Loads a pipeline fixture and writes it back out.
    fn reload(name: &str) -> PipelineFile {
        let (build_ctx, upload_ctx) = contexts();
        let file = PipelineFile::from_json(&read_fixture(name))
            .unwrap_or_else(|e| panic!("failed to load {name}: {e}"));
        let build = file.build_pipeline(&build_ctx).unwrap();
        let upload = file.upload_pipeline(&upload_ctx).unwrap();
        PipelineFile::capture(&build, &upload)
    }

    fn as_value(file: &PipelineFile) -> serde_json::Value {
        serde_json::to_value(file).unwrap()
    }

    #[test]
    fn current_pipeline_round_trips() {
        let saved = reload("pipeline_current.json");
        assert_eq!(
            as_value(&saved),
            load_json("pipeline_current.json"),
            "round-trip mismatch:\n{}",
            saved.to_json().unwrap()
        );
    }

    #[test]
    fn legacy_names_migrate_to_current_ids() {
        let migrated = reload("pipeline_legacy.json");
        assert_eq!(
            as_value(&migrated),
            load_json("pipeline_current.json"),
            "migration mismatch:\n{}",
            migrated.to_json().unwrap()
        );
    }

    #[test]
    fn saved_form_is_stable() {
        let (build_ctx, upload_ctx) = contexts();
        let first = reload("pipeline_legacy.json");
        let text = first.to_json().unwrap();

        let again = PipelineFile::from_json(&text).unwrap();
        let build = again.build_pipeline(&build_ctx).unwrap();
        let upload = again.upload_pipeline(&upload_ctx).unwrap();
        assert_eq!(PipelineFile::capture(&build, &upload), first);
    }

    #[test]
    fn stale_references_degrade_to_unset() {
        let saved = reload("pipeline_stale.json");
        let upload = &saved.upload;

        assert_eq!(upload[0].config.get_u32("user_id"), Some(7));
        assert!(!upload[0].config.contains_key("game_id"));

        assert!(!upload[1].config.contains_key("channel_id"));
        assert!(!upload[1].config.contains_key("channel"));

        // A stale id still resolves through a valid legacy name.
        assert_eq!(upload[2].config.get_u32("channel_id"), Some(41));
    }

    #[test]
    fn stale_references_block_readiness() {
        let (_, upload_ctx) = contexts();
        let file = PipelineFile::from_json(&read_fixture("pipeline_stale.json")).unwrap();
        let upload = file.upload_pipeline(&upload_ctx).unwrap();

        match upload.check_ready(&upload_ctx) {
            Err(PipelineError::NotReady {
                index,
                action,
                reason,
            }) => {
                assert_eq!(index, 0);
                assert_eq!(action, "Itch.io Upload");
                assert_eq!(reason, "No itch.io game selected");
            }
            other => panic!("expected NotReady, got {other:?}"),
        }
    }

    #[test]
    fn current_pipeline_is_ready() {
        let (build_ctx, upload_ctx) = contexts();
        let file = PipelineFile::from_json(&read_fixture("pipeline_current.json")).unwrap();
        file.build_pipeline(&build_ctx)
            .unwrap()
            .check_ready(&build_ctx)
            .unwrap();
        file.upload_pipeline(&upload_ctx)
            .unwrap()
            .check_ready(&upload_ctx)
            .unwrap();
    }
}
