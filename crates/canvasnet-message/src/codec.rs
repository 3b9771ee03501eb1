use std::time::Duration;

use bytes::{BufMut, BytesMut};
use tracing::trace;

use crate::error::{MessageError, Result};
use crate::kind::MessageType;
use crate::message::{Body, Message};

/// Header: payload length (2) + type tag (1) = 3 bytes.
pub const HEADER_SIZE: usize = 3;

/// Largest payload the 16-bit length prefix can announce.
pub const MAX_PAYLOAD_SIZE: usize = u16::MAX as usize;

pub const MAX_MESSAGE_SIZE: usize = HEADER_SIZE + MAX_PAYLOAD_SIZE;

/// Total wire length of the message starting at `prefix`.
///
/// Only the first two bytes are inspected.
///
/// # Panics
///
/// Panics if `prefix` holds fewer than two bytes.
pub fn sniff_length(prefix: &[u8]) -> usize {
    assert!(
        prefix.len() >= 2,
        "sniff_length needs two bytes, got {}",
        prefix.len()
    );
    HEADER_SIZE + u16::from_be_bytes([prefix[0], prefix[1]]) as usize
}

/// Encode a message into the wire format.
///
/// Wire format:
/// ```text
/// ┌──────────────┬──────────┬──────────┬──────────────────┐
/// │ Length       │ Type     │ Context  │ Body             │
/// │ (2B BE)      │ (1B)     │ (1B)     │ (Length-1 bytes) │
/// └──────────────┴──────────┴──────────┴──────────────────┘
/// ```
/// Length counts the context byte and the body.
pub fn encode_message(message: &Message, dst: &mut BytesMut) -> Result<()> {
    let payload_len = message.payload_length();
    if payload_len > MAX_PAYLOAD_SIZE {
        return Err(MessageError::PayloadTooLarge {
            size: payload_len,
            max: MAX_PAYLOAD_SIZE,
        });
    }
    dst.reserve(HEADER_SIZE + payload_len);
    dst.put_u16(payload_len as u16);
    dst.put_u8(message.message_type().as_u8());
    dst.put_u8(message.context_id());
    message.body().write_body(dst);
    Ok(())
}

/// Decode one complete message from the start of `buf`.
///
/// Bytes past the announced length are ignored.
pub fn deserialize(buf: &[u8]) -> Result<Message> {
    if buf.len() < HEADER_SIZE {
        return Err(MessageError::Truncated {
            needed: HEADER_SIZE,
            available: buf.len(),
        });
    }
    let total = sniff_length(buf);
    if buf.len() < total {
        return Err(MessageError::Truncated {
            needed: total,
            available: buf.len(),
        });
    }

    let kind = MessageType::try_from(buf[2])?;
    let payload = &buf[HEADER_SIZE..total];
    let Some((&ctx, body)) = payload.split_first() else {
        return Err(MessageError::InvalidPayload {
            message_type: kind,
            reason: "missing context id",
        });
    };

    let body = Body::read(kind, body)?;
    Ok(Message::new(ctx, body))
}

/// Decode a message from a stream buffer.
///
/// Returns `Ok(None)` if the buffer doesn't hold a complete message yet.
/// A complete message is always consumed, even when it fails to decode, so
/// the next call starts at the following message.
pub fn decode_message(src: &mut BytesMut) -> Result<Option<Message>> {
    if src.len() < 2 {
        return Ok(None);
    }
    let total = sniff_length(src);
    if src.len() < total {
        src.reserve(total - src.len());
        return Ok(None);
    }

    let frame = src.split_to(total);
    match deserialize(&frame) {
        Ok(message) => Ok(Some(message)),
        Err(err) => {
            trace!(
                tag = frame.get(2).copied(),
                len = total,
                error = %err,
                "skipping undecodable message"
            );
            Err(err)
        }
    }
}

/// Configuration for blocking message I/O.
#[derive(Debug, Clone, Default)]
pub struct MessageConfig {
    /// Read timeout for blocking operations.
    pub read_timeout: Option<Duration>,
    /// Write timeout for blocking operations.
    pub write_timeout: Option<Duration>,
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::payload::{
        AnnotationCreate, AnnotationDelete, AnnotationEdit, AnnotationRect, AnnotationReshape,
        CanvasResize, Chat, LayerAcl, LayerAttributes, LayerCreate, LayerDelete, LayerOrder,
        LayerRetitle, Login, PenMove, PenPoint, PutImage, SessionConfig, SessionTitle,
        SnapshotMode, StreamPos, ToolChange, Undo, UserAttr, UserJoin,
    };

    /// One representative message per type. Text fields end in a two-byte
    /// character so that dropping the last byte breaks UTF-8.
    fn sample(kind: MessageType) -> Message {
        let ctx = 7;
        let rect = AnnotationRect {
            id: 0x0102,
            x: -40,
            y: 1 << 20,
            width: 300,
            height: 120,
        };
        match kind {
            MessageType::Login => Message::new(ctx, Login { message: "welcomé".into() }),
            MessageType::UserJoin => Message::new(ctx, UserJoin { name: "zoé".into() }),
            MessageType::UserAttr => Message::new(ctx, UserAttr { attrs: UserAttr::OPERATOR }),
            MessageType::UserLeave => Message::user_leave(ctx),
            MessageType::Chat => Message::new(
                ctx,
                Chat {
                    flags: Chat::ACTION,
                    text: "waves café".into(),
                },
            ),
            MessageType::LayerAcl => Message::new(
                ctx,
                LayerAcl {
                    layer: 3,
                    locked: true,
                    exclusive: vec![1, 4, 9],
                },
            ),
            MessageType::Snapshot => Message::new(ctx, SnapshotMode { mode: SnapshotMode::ACK }),
            MessageType::SessionTitle => Message::new(ctx, SessionTitle { title: "soiré".into() }),
            MessageType::SessionConfig => Message::new(
                ctx,
                SessionConfig {
                    max_users: 20,
                    flags: SessionConfig::LOCKED,
                },
            ),
            MessageType::StreamPos => Message::new(ctx, StreamPos { position: 0xDEAD_BEEF }),
            MessageType::CanvasResize => Message::new(
                ctx,
                CanvasResize {
                    top: -10,
                    right: 200,
                    bottom: 0,
                    left: i32::MIN,
                },
            ),
            MessageType::LayerCreate => Message::new(
                ctx,
                LayerCreate {
                    id: 2,
                    fill: 0xFF00_FF00,
                    title: "fondé".into(),
                },
            ),
            MessageType::LayerAttributes => Message::new(
                ctx,
                LayerAttributes {
                    id: 2,
                    opacity: 128,
                    blend: 5,
                },
            ),
            MessageType::LayerRetitle => Message::new(
                ctx,
                LayerRetitle {
                    id: 2,
                    title: "fond é".into(),
                },
            ),
            MessageType::LayerOrder => Message::new(ctx, LayerOrder { order: vec![3, 1, 2] }),
            MessageType::LayerDelete => Message::new(ctx, LayerDelete { id: 2, merge: true }),
            MessageType::PutImage => Message::new(
                ctx,
                PutImage {
                    layer: 1,
                    flags: PutImage::BLEND,
                    x: 10,
                    y: 20,
                    width: 2,
                    height: 2,
                    image: Bytes::from_static(&[9, 8, 7, 6, 5]),
                },
            ),
            MessageType::ToolChange => Message::new(
                ctx,
                ToolChange {
                    layer: 1,
                    blend: 2,
                    mode: 3,
                    spacing: 25,
                    color_high: 0xFF11_2233,
                    color_low: 0xFF44_5566,
                    hardness_high: 255,
                    hardness_low: 10,
                    size_high: 12,
                    size_low: 1,
                    opacity_high: 200,
                    opacity_low: 20,
                },
            ),
            MessageType::PenMove => Message::new(
                ctx,
                PenMove {
                    points: vec![
                        PenPoint {
                            x: 1,
                            y: -1,
                            pressure: 0,
                        },
                        PenPoint {
                            x: 70_000,
                            y: 3,
                            pressure: u16::MAX,
                        },
                    ],
                },
            ),
            MessageType::PenUp => Message::new(ctx, Body::PenUp),
            MessageType::AnnotationCreate => Message::new(ctx, AnnotationCreate(rect)),
            MessageType::AnnotationReshape => Message::new(ctx, AnnotationReshape(rect)),
            MessageType::AnnotationEdit => Message::new(
                ctx,
                AnnotationEdit {
                    id: 0x0102,
                    background: 0x8000_0000,
                    text: "note é".into(),
                },
            ),
            MessageType::AnnotationDelete => Message::new(ctx, AnnotationDelete { id: 0x0102 }),
            MessageType::UndoPoint => Message::undo_point(ctx),
            MessageType::Undo => Message::new(
                ctx,
                Undo {
                    override_user: 3,
                    points: -2,
                },
            ),
        }
    }

    #[test]
    fn every_type_survives_the_wire() {
        // Types whose trailing list may legally shrink by one byte.
        let open_ended = [
            MessageType::LayerAcl,
            MessageType::LayerOrder,
            MessageType::PutImage,
        ];

        for kind in MessageType::ALL {
            let message = sample(kind);
            assert_eq!(message.message_type(), kind);

            let wire = message.to_bytes().unwrap();
            assert_eq!(wire.len(), message.length(), "{kind}");
            assert_eq!(sniff_length(&wire[..2]), message.length(), "{kind}");
            assert_eq!(wire[2], kind.as_u8(), "{kind}");
            assert_eq!(deserialize(&wire).unwrap(), message, "{kind}");

            let mut cut = wire[..wire.len() - 1].to_vec();
            let shorter = (message.payload_length() - 1) as u16;
            cut[..2].copy_from_slice(&shorter.to_be_bytes());
            match deserialize(&cut) {
                Err(err) => assert!(err.is_decode(), "{kind}: {err}"),
                Ok(other) => {
                    assert!(open_ended.contains(&kind), "{kind} accepted a short payload");
                    assert_ne!(other, message, "{kind}");
                }
            }
        }
    }

    #[test]
    fn chat_wire_layout() {
        let mut buf = BytesMut::new();
        encode_message(&Message::chat(5, "hi"), &mut buf).unwrap();
        assert_eq!(buf.as_ref(), &[0x00, 0x04, 4, 5, 0, b'h', b'i']);
    }

    #[test]
    fn sniff_reads_only_two_bytes() {
        let msg = Message::new(
            1,
            Chat {
                flags: Chat::ACTION,
                text: "waves".into(),
            },
        );
        let wire = msg.to_bytes().unwrap();
        assert_eq!(sniff_length(&wire[..2]), wire.len());
        assert_eq!(sniff_length(&wire[..2]), msg.length());
    }

    #[test]
    #[should_panic(expected = "needs two bytes")]
    fn sniff_with_one_byte_panics() {
        sniff_length(&[0]);
    }

    #[test]
    fn deserialize_ignores_following_bytes() {
        let mut buf = BytesMut::new();
        encode_message(&Message::undo_point(7), &mut buf).unwrap();
        encode_message(&Message::chat(7, "next"), &mut buf).unwrap();

        let first = deserialize(&buf).unwrap();
        assert_eq!(first, Message::undo_point(7));
    }

    #[test]
    fn decode_waits_for_complete_message() {
        let wire = Message::chat(2, "partial").to_bytes().unwrap();
        let mut buf = BytesMut::new();
        for (i, byte) in wire.iter().enumerate() {
            assert!(decode_message(&mut buf).unwrap().is_none(), "byte {i}");
            buf.put_u8(*byte);
        }
        let msg = decode_message(&mut buf).unwrap().unwrap();
        assert_eq!(msg, Message::chat(2, "partial"));
        assert!(buf.is_empty());
    }

    #[test]
    fn unknown_command_tag_is_an_error() {
        // Command-range tag with a one-byte payload.
        let mut buf = BytesMut::from(&[0x00, 0x01, 200, 3][..]);
        let err = decode_message(&mut buf).unwrap_err();
        assert!(matches!(err, MessageError::UnknownType(200)));
        assert!(err.is_decode());
        assert!(buf.is_empty(), "bad message must be consumed");
    }

    #[test]
    fn stream_stays_aligned_after_bad_message() {
        let mut buf = BytesMut::new();
        // Pen move with three body bytes: not a whole point.
        buf.put_slice(&[0x00, 0x04, MessageType::PenMove.as_u8(), 1, 0, 0, 0]);
        encode_message(&Message::chat(1, "after"), &mut buf).unwrap();

        let err = decode_message(&mut buf).unwrap_err();
        assert!(matches!(
            err,
            MessageError::InvalidPayload {
                message_type: MessageType::PenMove,
                ..
            }
        ));
        let next = decode_message(&mut buf).unwrap().unwrap();
        assert_eq!(next, Message::chat(1, "after"));
    }

    #[test]
    fn zero_length_payload_lacks_context() {
        let err = deserialize(&[0x00, 0x00, MessageType::PenUp.as_u8()]).unwrap_err();
        assert!(matches!(err, MessageError::InvalidPayload { .. }));
    }

    #[test]
    fn short_buffer_is_truncated_not_panic() {
        let err = deserialize(&[0x00, 0x09, 4, 1]).unwrap_err();
        assert!(matches!(
            err,
            MessageError::Truncated {
                needed: 12,
                available: 4
            }
        ));
    }

    #[test]
    fn oversized_payload_is_rejected_on_encode() {
        let points = vec![
            PenPoint {
                x: 0,
                y: 0,
                pressure: 0
            };
            MAX_PAYLOAD_SIZE / PenPoint::WIRE_SIZE + 1
        ];
        let mut buf = BytesMut::new();
        let err = encode_message(&Message::new(1, PenMove { points }), &mut buf).unwrap_err();
        assert!(matches!(err, MessageError::PayloadTooLarge { .. }));
        assert!(buf.is_empty());
    }

    #[test]
    fn largest_pen_move_fits() {
        let count = (MAX_PAYLOAD_SIZE - 1) / PenPoint::WIRE_SIZE;
        let stroke = Message::new(
            1,
            PenMove {
                points: vec![
                    PenPoint {
                        x: -5,
                        y: 5,
                        pressure: 100
                    };
                    count
                ],
            },
        );
        let wire = stroke.to_bytes().unwrap();
        assert_eq!(deserialize(&wire).unwrap(), stroke);
    }

    #[test]
    fn negative_undo_count_survives_encoding() {
        let redo = Message::new(
            3,
            Undo {
                override_user: 0,
                points: -2,
            },
        );
        let wire = redo.to_bytes().unwrap();
        assert_eq!(wire[wire.len() - 1], 0xFE);
        assert_eq!(deserialize(&wire).unwrap(), redo);
    }
}
