// tests/validation_props.rs

use proptest::prelude::*;

use ogc_runner::config::{check_conflicts, RawTaskDescriptor};
use ogc_runner::env::EnvSnapshot;

#[derive(Debug, Clone)]
struct Knobs {
    command: bool,
    script: bool,
    script_path: bool,
    entry_point: bool,
    retries: Option<u32>,
    timeout: Option<u64>,
    wait_for_success: bool,
    back_off: Option<u64>,
}

fn knobs_strategy() -> impl Strategy<Value = Knobs> {
    (
        any::<bool>(),
        any::<bool>(),
        any::<bool>(),
        any::<bool>(),
        proptest::option::of(0u32..5),
        proptest::option::of(1u64..3600),
        any::<bool>(),
        proptest::option::of(0u64..60),
    )
        .prop_map(
            |(command, script, script_path, entry_point, retries, timeout, wait, back_off)| Knobs {
                command,
                script,
                script_path,
                entry_point,
                retries,
                timeout,
                wait_for_success: wait,
                back_off,
            },
        )
}

// Every selected mode is individually well formed, so only the
// cross-option rules can fail.
fn descriptor(k: &Knobs) -> RawTaskDescriptor {
    RawTaskDescriptor {
        name: Some("prop".into()),
        command: k.command.then(|| "true".to_string()),
        script: k.script.then(|| "#!/bin/sh\ntrue".to_string()),
        script_path: k.script_path.then(|| "run.sh".into()),
        executable: k.script_path.then(|| "sh".to_string()),
        entry_point: k.entry_point.then(|| vec!["true".to_string()]),
        retries: k.retries,
        timeout: k.timeout,
        wait_for_success: k.wait_for_success,
        back_off: k.back_off,
        ..RawTaskDescriptor::default()
    }
}

fn mode_count(k: &Knobs) -> usize {
    [k.command, k.script, k.script_path, k.entry_point]
        .iter()
        .filter(|set| **set)
        .count()
}

proptest! {
    #[test]
    fn valid_exactly_when_all_rules_hold(k in knobs_strategy()) {
        let expected_ok = mode_count(&k) == 1
            && !(k.retries.is_some() && k.timeout.is_some())
            && !(k.wait_for_success && k.back_off.is_none());

        let res = check_conflicts(&descriptor(&k), 0, &EnvSnapshot::empty());
        prop_assert_eq!(res.is_ok(), expected_ok, "knobs: {:?} result: {:?}", k, res);
    }

    #[test]
    fn retries_with_timeout_is_always_rejected(k in knobs_strategy(), retries in 0u32..5, timeout in 1u64..600) {
        let k = Knobs { retries: Some(retries), timeout: Some(timeout), ..k };
        let res = check_conflicts(&descriptor(&k), 0, &EnvSnapshot::empty());
        let msg = format!("{:?}", res.unwrap_err());
        prop_assert!(msg.contains("`retries` OR a `timeout`"));
    }

    #[test]
    fn validated_descriptor_keeps_the_single_mode(k in knobs_strategy()) {
        let raw = descriptor(&k);
        if check_conflicts(&raw, 0, &EnvSnapshot::empty()).is_ok() {
            let task = raw.validate(0, &EnvSnapshot::empty()).unwrap();
            let expected = if k.command {
                "command"
            } else if k.script {
                "script"
            } else if k.script_path {
                "script_path"
            } else {
                "entry_point"
            };
            prop_assert_eq!(task.mode.key(), expected);
            prop_assert_eq!(task.policy.retries, k.retries);
        }
    }
}
