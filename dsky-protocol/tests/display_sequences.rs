// End-to-end checks: socket bytes in, controller bytes out.
use dsky_protocol::{
    ChannelFrame, CommandEncoder, ControlLineEvent, Digit, Dispatcher, DisplayField, FrameCodec,
    Indicator, PeripheralCommand, PeripheralRole, ProtocolConfig, Row, Sign,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Encode a list of (channel, data) pairs as one socket byte stream
fn stream(frames: &[(u8, u16)]) -> Vec<u8> {
    frames
        .iter()
        .flat_map(|&(channel, data)| FrameCodec::encode(ChannelFrame::new(channel, data)))
        .collect()
}

fn run(dispatcher: &mut Dispatcher, bytes: &[u8]) -> Vec<PeripheralCommand> {
    let mut codec = FrameCodec::new();
    codec
        .feed(bytes)
        .into_iter()
        .flat_map(|frame| dispatcher.handle_frame(frame))
        .collect()
}

#[test]
fn test_sign_exercise_sequence() {
    init_logging();
    let mut dispatcher = Dispatcher::default();

    let plus = stream(&[(8, 0x3FBD), (8, 0x2FBD), (8, 0x17BD)]);
    run(&mut dispatcher, &plus);
    for row in Row::ALL {
        assert_eq!(dispatcher.display().sign(row), Sign::Plus, "{}", row);
    }

    let blank = stream(&[(8, 0x3BBD), (8, 0x2BBD), (8, 0x13BD)]);
    run(&mut dispatcher, &blank);
    for row in Row::ALL {
        assert_eq!(dispatcher.display().sign(row), Sign::Blank, "{}", row);
    }

    let minus = stream(&[(8, 0x37BD), (8, 0x27BD), (8, 0x0FBD)]);
    let commands = run(&mut dispatcher, &minus);
    let signs: Vec<_> = commands
        .iter()
        .filter(|c| matches!(c, PeripheralCommand::Sign { .. }))
        .collect();
    assert_eq!(signs.len(), 3);
    for row in Row::ALL {
        assert_eq!(dispatcher.display().sign(row), Sign::Minus, "{}", row);
    }
}

#[test]
fn test_full_display_picture() {
    init_logging();
    let mut dispatcher = Dispatcher::default();

    let bytes = stream(&[
        (8, 0x5AB5),
        (8, 0x52BC),
        (8, 0x4B7C),
        (8, 0x42B5),
        (8, 0x3AB5),
        (8, 0x347E),
        (8, 0x2AB5),
        (8, 0x26A3),
        (8, 0x1B35),
        (8, 0x16BE),
        (8, 0x0B9D),
    ]);
    run(&mut dispatcher, &bytes);

    let display = dispatcher.display();
    let read = |fields: &[DisplayField]| -> String {
        fields
            .iter()
            .map(|f| display.digit(*f).map_or('?', |d| d.to_string().chars().next().unwrap_or('?')))
            .collect()
    };

    assert_eq!(read(&[DisplayField::Md1, DisplayField::Md2]), "00");
    assert_eq!(read(&[DisplayField::Vd1, DisplayField::Vd2]), "06");
    assert_eq!(read(&[DisplayField::Nd1, DisplayField::Nd2]), "36");
    assert_eq!(
        read(&[DisplayField::R1d1, DisplayField::R1d2, DisplayField::R1d3, DisplayField::R1d4, DisplayField::R1d5]),
        "00015"
    );
    assert_eq!(
        read(&[DisplayField::R2d1, DisplayField::R2d2, DisplayField::R2d3, DisplayField::R2d4, DisplayField::R2d5]),
        "00012"
    );
    assert_eq!(
        read(&[DisplayField::R3d1, DisplayField::R3d2, DisplayField::R3d3, DisplayField::R3d4, DisplayField::R3d5]),
        "00568"
    );
    assert_eq!(display.sign(Row::R1), Sign::Minus);
    assert_eq!(display.sign(Row::R2), Sign::Minus);
    assert_eq!(display.sign(Row::R3), Sign::Plus);
    assert_eq!(display.stats().invalid_patterns, 0);
}

#[test]
fn test_encoded_output_for_one_frame() {
    init_logging();
    let mut dispatcher = Dispatcher::default();
    let commands = run(&mut dispatcher, &[0x01, 0x45, 0xAE, 0xFD]);

    let wire: Vec<Vec<u8>> = commands.iter().map(CommandEncoder::encode).collect();
    assert_eq!(wire, vec![b"3 8".to_vec(), b"4 8".to_vec()]);
    assert!(commands.iter().all(|c| c.role() == PeripheralRole::Display));
}

#[test]
fn test_indicator_channels_over_socket() {
    init_logging();
    let mut dispatcher = Dispatcher::new(ProtocolConfig::new().with_indicator_words(true));

    // Channel 11: COMP ACTY + KEY REL; channel 163: OPR ERR + RESTART
    let bytes = stream(&[(9, 0x0012), (0o163, 0x00C0), (9, 0x0012)]);
    let commands = run(&mut dispatcher, &bytes);

    assert!(commands.contains(&PeripheralCommand::CompActy { lit: true }));
    assert!(commands.contains(&PeripheralCommand::Lamp { indicator: Indicator::KeyRel, lit: true }));
    assert!(commands.contains(&PeripheralCommand::Lamp { indicator: Indicator::OprErr, lit: true }));
    assert!(commands.contains(&PeripheralCommand::Lamp { indicator: Indicator::Restart, lit: true }));

    // The repeated channel 11 frame adds nothing
    let words: Vec<u16> = commands
        .iter()
        .filter_map(|c| match c {
            PeripheralCommand::IndicatorWord { word } => Some(*word),
            _ => None,
        })
        .collect();
    let key_rel = Indicator::KeyRel.word_mask();
    let all_three = key_rel | Indicator::OprErr.word_mask() | Indicator::Restart.word_mask();
    assert_eq!(words, vec![key_rel, all_three]);
    assert_eq!(key_rel, 8);
    assert_eq!(all_three, 280);
    assert_eq!(commands.len(), 6);
}

#[test]
fn test_reset_then_replay_matches_fresh_start() {
    init_logging();
    let sequence = stream(&[(8, 0x3FBD), (8, 0x347E), (8, 0x6000 | 0x0018)]);

    let mut fresh = Dispatcher::default();
    let expected = run(&mut fresh, &sequence);

    let mut used = Dispatcher::default();
    run(&mut used, &stream(&[(8, 0x37BD), (8, 0x2FBD), (9, 0x007E)]));
    used.handle_event(ControlLineEvent::Reset);

    assert_eq!(run(&mut used, &sequence), expected);
}

#[test]
fn test_hardware_and_socket_paths_agree() {
    init_logging();
    let values = [0x5BBD, 0x3FBD, 0x347E, 0x0B9D];

    let mut hardware = Dispatcher::default();
    let from_lines: Vec<_> = values
        .iter()
        .flat_map(|&v| hardware.handle_event(ControlLineEvent::Disp(v)).commands)
        .collect();

    let mut socket = Dispatcher::default();
    let bytes = stream(&values.iter().map(|&v| (8, v)).collect::<Vec<_>>());
    assert_eq!(run(&mut socket, &bytes), from_lines);

    assert_eq!(
        hardware.display().digit(DisplayField::R3d5),
        Some(Digit::Decimal(8))
    );
}
