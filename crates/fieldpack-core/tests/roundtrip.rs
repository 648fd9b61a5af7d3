use fieldpack_core::{
    ByteList, Codec, CodecError, Record, SchemaConfig, StringMode, TransformRegistry, Value,
};
use proptest::prelude::*;

/// Type tags whose decode/encode pair is lossless over arbitrary bytes,
/// with their element width
const TAGS: &[(&str, usize)] = &[
    ("Uint8", 1),
    ("int8", 1),
    ("Uint16", 2),
    ("int16", 2),
    ("Uint32", 4),
    ("int32", 4),
    ("Uint64", 8),
    ("int64", 8),
    ("float", 4),
    ("double", 8),
    ("char", 1),
    ("string", 1),
    ("unknown", 1),
    ("options", 1),
    ("blob", 1),
];

fn registry() -> TransformRegistry {
    TransformRegistry::new().with("options", ByteList)
}

fn render(fields: &[(usize, usize)], big_endian: bool) -> (String, usize) {
    let mut text = String::new();
    if big_endian {
        text.push_str(">\n");
    }

    let mut total = 0;
    for (i, &(tag, count)) in fields.iter().enumerate() {
        let (name, width) = TAGS[tag];
        text.push_str(&format!("{}[{}] field_{}\n", name, count, i));
        total += width * count;
    }
    (text, total)
}

fn string_mode() -> impl Strategy<Value = StringMode> {
    prop_oneof![
        Just(StringMode::Raw),
        Just(StringMode::TrimNul),
        Just(StringMode::TrimSpace),
    ]
}

/// A layout, a buffer of its exact length, and the codec compiling it
fn layout_and_buffer() -> impl Strategy<Value = (Codec, Vec<u8>)> {
    (
        prop::collection::vec((0..TAGS.len(), 1usize..6), 1..12),
        any::<bool>(),
        string_mode(),
    )
        .prop_flat_map(|(fields, big_endian, mode)| {
            let (text, total) = render(&fields, big_endian);
            let config = SchemaConfig::new().string_mode(mode);
            let codec = Codec::compile_with_config(&text, &registry(), &config).unwrap();
            (Just(codec), prop::collection::vec(any::<u8>(), total))
        })
}

fn finite_f32() -> impl Strategy<Value = f32> {
    any::<f32>().prop_filter("finite", |v| v.is_finite())
}

fn finite_f64() -> impl Strategy<Value = f64> {
    any::<f64>().prop_filter("finite", |v| v.is_finite())
}

proptest! {
    #[test]
    fn prop_pack_of_unpack_restores_buffer((codec, data) in layout_and_buffer()) {
        prop_assert_eq!(codec.record_length(), data.len());

        let record = codec.unpack(&data).unwrap();
        prop_assert_eq!(codec.pack(&record).unwrap(), data);
    }

    #[test]
    fn prop_unpack_of_pack_restores_record(
        score in any::<u32>(),
        delta in any::<i16>(),
        ratio in finite_f32(),
        weight in finite_f64(),
        alive in any::<bool>(),
        history in prop::collection::vec(any::<u16>(), 3),
        name in "[A-Za-z ]{0,8}",
    ) {
        let codec = Codec::compile(
            "
            >
            Uint32     score
            int16      delta
            float      ratio
            double     weight
            bool       alive
            Uint16[3]  history
            string[8]  name
            ",
            &registry(),
        )
        .unwrap();

        let mut padded = name.clone().into_bytes();
        padded.resize(8, 0);

        let record = Record::new()
            .with("score", score)
            .with("delta", delta)
            .with("ratio", ratio)
            .with("weight", weight)
            .with("alive", alive)
            .with("history", history.into_iter().map(Value::from).collect::<Vec<_>>())
            .with("name", padded);

        let packed = codec.pack(&record).unwrap();
        prop_assert_eq!(packed.len(), codec.record_length());
        prop_assert_eq!(codec.unpack(&packed).unwrap(), record);
    }

    #[test]
    fn prop_wrong_length_is_rejected((codec, data) in layout_and_buffer(), grow in any::<bool>()) {
        let mut wrong = data.clone();
        if grow || wrong.is_empty() {
            wrong.push(0);
        } else {
            wrong.pop();
        }

        let is_length_mismatch = matches!(
            codec.unpack(&wrong),
            Err(CodecError::LengthMismatch { .. })
        );
        prop_assert!(is_length_mismatch);
    }

    #[test]
    fn prop_any_missing_field_is_rejected(
        (codec, data) in layout_and_buffer(),
        pick in any::<prop::sample::Index>(),
    ) {
        let mut record = codec.unpack(&data).unwrap();

        let names: Vec<String> = record.keys().map(str::to_string).collect();
        let victim = &names[pick.index(names.len())];
        record.remove(victim);

        let is_missing = matches!(
            codec.pack(&record),
            Err(CodecError::MissingField { ref name }) if name == victim
        );
        prop_assert!(is_missing);
    }
}

#[test]
fn trimmed_strings_round_trip_through_padding() {
    let registry = registry();
    for (mode, data) in [
        (StringMode::TrimNul, &b"AB\x00C\x00\x00"[..]),
        (StringMode::TrimNul, &b"\xff\xfe\x00\x00\x00\x00"[..]),
        (StringMode::TrimSpace, &b"A B   "[..]),
        (StringMode::TrimSpace, &b"      "[..]),
    ] {
        let config = SchemaConfig::new().string_mode(mode);
        let codec = Codec::compile_with_config("string[6] s", &registry, &config).unwrap();
        let record = codec.unpack(data).unwrap();
        assert_eq!(codec.pack(&record).unwrap(), data.to_vec(), "{:?}", mode);
    }
}

#[test]
fn options_round_trip_over_every_byte() {
    let codec = Codec::compile("options[6] options", &registry()).unwrap();

    for byte in 0..=u8::MAX {
        let data = [byte, byte.wrapping_add(1), 0, 255, byte, 7];
        let record = codec.unpack(&data).unwrap();
        assert_eq!(record["options"].as_list().map(<[Value]>::len), Some(6));
        assert_eq!(codec.pack(&record).unwrap(), data.to_vec());
    }
}
