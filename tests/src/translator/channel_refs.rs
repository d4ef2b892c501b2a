use crate::utils::{translate_file, translate_source};
use rtseq_sequence::{Expression, Statement, Value, ValueType};
use rtseq_translator::{ErrorKind, TranslateError};

#[test]
fn test_channel_ref_type_string() {
    let sequence = translate_file("channels", "channel_ref_type_string").unwrap();
    assert!(sequence.variables.is_empty());
    assert_eq!(sequence.channels.len(), 1);
    assert_eq!(sequence.channels[0].alias, "Aliases/DesiredRPM");
}

#[test]
fn test_channel_ref_setter() {
    let sequence = translate_file("channels", "channel_ref_setter").unwrap();
    assert_eq!(sequence.body.len(), 1);
    assert_eq!(
        sequence.body[0],
        Statement::ChannelWrite {
            channel: "ch_a".to_string(),
            value: Expression::Literal(Value::Int32(5)),
        }
    );
    assert_eq!(sequence.body[0].to_string(), "ch_a = 5");
}

#[test]
fn test_channel_ref_return() {
    let error = translate_file("channels", "channel_ref_return").unwrap_err();
    assert!(matches!(error, TranslateError::ChannelReturn { ref name, .. } if name == "ch"));
    assert_eq!(error.kind(), ErrorKind::Structural);
}

#[test]
fn test_channel_augmented_write_reads_then_writes() {
    let sequence = translate_file("channels", "engine_ramp").unwrap();
    let aliases: Vec<&str> = sequence.channels.iter().map(|c| c.alias.as_str()).collect();
    assert_eq!(aliases, vec!["Aliases/TargetRPM", "Targets/Engine/RPM"]);
    let Statement::While { condition, body } = &sequence.body[0] else {
        panic!("expected a while loop");
    };
    assert_eq!(condition.to_string(), "rpm < target");
    assert_eq!(body[0].to_string(), "rpm = rpm + 500");
    assert!(matches!(&body[0], Statement::ChannelWrite { .. }));
}

#[test]
fn test_fault_statements() {
    let sequence = translate_file("channels", "fault_and_restore").unwrap();
    let lines: Vec<String> = sequence.body.iter().map(ToString::to_string).collect();
    assert_eq!(
        lines,
        vec![
            "rpm = 1000",
            "fault(rpm, 9000)",
            "a = rpm",
            "clearfault(rpm)",
            "b = rpm",
            "return a + b",
        ]
    );
}

#[test]
fn test_channel_cannot_be_passed_by_reference() {
    let error = translate_source(
        r#"
@NivsParam('param', DoubleValue(0), NivsParam.BY_REF)
@nivs_rt_sequence
def bump(param):
    param.value += 1

@nivs_rt_sequence
def channel_ref_by_ref():
    ch = ChannelReference('Aliases/DesiredRPM')
    bump(ch)
"#,
        "channel_ref_by_ref",
    )
    .unwrap_err();
    assert!(matches!(
        error,
        TranslateError::InvalidReferenceArgument {
            ref callee,
            index: 0,
            expected: ValueType::Double,
            ..
        } if callee == "bump"
    ));
    assert_eq!(error.kind(), ErrorKind::Structural);
}
