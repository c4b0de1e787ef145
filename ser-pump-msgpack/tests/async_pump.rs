use ser_pump_msgpack::{to_vec, AsyncUnpacker, Config, Error, Phase, Value};
use tokio::io::AsyncWriteExt;

fn sample() -> Vec<Value> {
    vec![
        Value::from("Hello World"),
        Value::Binary(vec![0x55; 300]),
        Value::Array(vec![Value::from(1u8), Value::Map(vec![(Value::from("k"), Value::Nil)])]),
        Value::from(-1i8),
    ]
}

fn encoded(values: &[Value]) -> Vec<u8> {
    values.iter().flat_map(|value| to_vec(value).unwrap()).collect()
}

#[tokio::test]
async fn test_async_from_slice() {
    let values = sample();
    let input = encoded(&values);
    let mut unpacker = AsyncUnpacker::with_buffer_size(&input[..], Config::default(), 3);
    for value in &values {
        assert_eq!(unpacker.next().await, Ok(Some(value.clone())));
    }
    assert_eq!(unpacker.next().await, Ok(None));
    assert_eq!(unpacker.buffered(), 0);
}

#[tokio::test]
async fn test_async_trickle() {
    let values = sample();
    let input = encoded(&values);
    let (mut writer, reader) = tokio::io::duplex(4);
    let feeder = tokio::spawn(async move {
        for byte in input {
            writer.write_all(&[byte]).await.unwrap();
            tokio::task::yield_now().await;
        }
    });
    let mut unpacker = AsyncUnpacker::new(reader);
    let mut decoded = Vec::new();
    while let Some(value) = unpacker.next().await.unwrap() {
        decoded.push(value);
    }
    feeder.await.unwrap();
    assert_eq!(decoded, values);
}

#[tokio::test]
async fn test_async_truncated() {
    let (mut writer, reader) = tokio::io::duplex(64);
    writer.write_all(b"\xc3\xd9\x1fHello").await.unwrap();
    drop(writer);
    let mut unpacker = AsyncUnpacker::new(reader);
    assert_eq!(unpacker.next().await, Ok(Some(Value::from(true))));
    assert_eq!(unpacker.next().await, Err(Error::UnexpectedEof {
        phase: Phase::Payload, expected: 31, obtained: 5 }));
    assert!(unpacker.unpacker().is_poisoned());
}
