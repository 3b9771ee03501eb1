#![cfg(unix)]

//! Every backend must report the same events, in the same order, for the
//! same socket states.

use std::io::Write;
use std::os::fd::AsRawFd;
use std::os::unix::net::UnixStream;

use canvasnet_reactor::{open, Backend, Event, EventMask, Multiplexer, WaitTimeout};

fn each_backend(mut check: impl FnMut(Box<dyn Multiplexer>)) {
    for backend in Backend::available() {
        let mut mux = open(*backend).expect("available backend should open");
        mux.set_timeout(WaitTimeout::from_millis(500));
        check(mux);
    }
}

fn drain(mux: &mut dyn Multiplexer) -> Vec<Event> {
    std::iter::from_fn(|| mux.next_event()).collect()
}

#[test]
fn ready_descriptors_follow_registration_order() {
    each_backend(|mut mux| {
        let (mut a_peer, a) = UnixStream::pair().unwrap();
        let (mut b_peer, b) = UnixStream::pair().unwrap();

        mux.add(a.as_raw_fd(), EventMask::READ | EventMask::WRITE)
            .unwrap();
        mux.add(b.as_raw_fd(), EventMask::READ).unwrap();

        // Make b ready first; order must still follow registration.
        b_peer.write_all(b"b").unwrap();
        a_peer.write_all(b"a").unwrap();

        let ready = mux.wait().unwrap();
        let events = drain(mux.as_mut());
        assert_eq!(ready, 2, "{}", mux.backend());
        assert_eq!(
            events,
            vec![
                Event {
                    fd: a.as_raw_fd(),
                    mask: EventMask::READ | EventMask::WRITE
                },
                Event {
                    fd: b.as_raw_fd(),
                    mask: EventMask::READ
                },
            ],
            "{}",
            mux.backend()
        );
        assert_eq!(mux.next_event(), None, "{}: exhausted", mux.backend());
    });
}

#[test]
fn yields_exactly_the_reported_count() {
    each_backend(|mut mux| {
        let pairs: Vec<_> = (0..8).map(|_| UnixStream::pair().unwrap()).collect();
        for (_, local) in &pairs {
            mux.add(local.as_raw_fd(), EventMask::READ).unwrap();
        }
        for (peer, _) in pairs.iter().step_by(3) {
            let mut writer = peer;
            writer.write_all(b"x").unwrap();
        }

        let ready = mux.wait().unwrap();
        let events = drain(mux.as_mut());
        assert_eq!(ready, 3, "{}", mux.backend());
        assert_eq!(events.len(), ready, "{}", mux.backend());

        let mut fds: Vec<_> = events.iter().map(|e| e.fd).collect();
        fds.dedup();
        assert_eq!(fds.len(), ready, "{}: no duplicates", mux.backend());
    });
}

#[test]
fn satisfied_mask_is_limited_to_interest() {
    each_backend(|mut mux| {
        let (mut peer, local) = UnixStream::pair().unwrap();
        mux.add(local.as_raw_fd(), EventMask::WRITE).unwrap();
        peer.write_all(b"unread").unwrap();

        assert_eq!(mux.wait().unwrap(), 1, "{}", mux.backend());
        assert_eq!(
            mux.next_event().map(|e| e.mask),
            Some(EventMask::WRITE),
            "{}",
            mux.backend()
        );
    });
}

#[test]
fn peer_hangup_reads_as_readable_everywhere() {
    each_backend(|mut mux| {
        let (peer, local) = UnixStream::pair().unwrap();
        mux.add(local.as_raw_fd(), EventMask::READ | EventMask::ERROR)
            .unwrap();
        drop(peer);

        assert_eq!(mux.wait().unwrap(), 1, "{}", mux.backend());
        assert_eq!(
            mux.next_event().map(|e| e.mask),
            Some(EventMask::READ),
            "{}",
            mux.backend()
        );
    });
}

#[test]
fn removal_during_iteration_skips_removed_descriptor() {
    each_backend(|mut mux| {
        let pairs: Vec<_> = (0..3).map(|_| UnixStream::pair().unwrap()).collect();
        for (peer, local) in &pairs {
            mux.add(local.as_raw_fd(), EventMask::READ).unwrap();
            let mut writer = peer;
            writer.write_all(b"x").unwrap();
        }

        assert_eq!(mux.wait().unwrap(), 3, "{}", mux.backend());
        let first = mux.next_event().unwrap();
        assert_eq!(first.fd, pairs[0].1.as_raw_fd());

        mux.remove(pairs[1].1.as_raw_fd()).unwrap();
        let (_late_peer, late) = UnixStream::pair().unwrap();
        mux.add(late.as_raw_fd(), EventMask::WRITE).unwrap();

        let rest: Vec<_> = drain(mux.as_mut()).iter().map(|e| e.fd).collect();
        assert_eq!(rest, vec![pairs[2].1.as_raw_fd()], "{}", mux.backend());
    });
}

#[test]
fn modify_switches_reported_direction() {
    each_backend(|mut mux| {
        let (_peer, local) = UnixStream::pair().unwrap();
        let fd = local.as_raw_fd();
        mux.add(fd, EventMask::READ).unwrap();
        mux.set_timeout(WaitTimeout::from_millis(10));
        assert_eq!(mux.wait().unwrap(), 0, "{}: nothing to read", mux.backend());

        mux.modify(fd, EventMask::READ | EventMask::WRITE).unwrap();
        assert_eq!(mux.interest(fd), Some(EventMask::READ | EventMask::WRITE));
        assert_eq!(mux.wait().unwrap(), 1, "{}", mux.backend());
        assert_eq!(mux.next_event().map(|e| e.mask), Some(EventMask::WRITE));

        mux.modify(fd, EventMask::NONE).unwrap();
        assert_eq!(mux.interest(fd), None, "{}", mux.backend());
        assert!(mux.is_empty());
    });
}

#[test]
#[should_panic(expected = "already registered")]
fn double_registration_panics() {
    let mut mux = open(Backend::Poll).unwrap();
    let (_peer, local) = UnixStream::pair().unwrap();
    mux.add(local.as_raw_fd(), EventMask::READ).unwrap();
    let _ = mux.add(local.as_raw_fd(), EventMask::WRITE);
}

#[test]
#[should_panic(expected = "not registered")]
fn modify_unregistered_panics() {
    let mut mux = open(Backend::Select).unwrap();
    let _ = mux.modify(42, EventMask::READ);
}
