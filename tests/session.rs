mod common;

use common::{MockTrustRoot, Step};
use tpm2_pcr::errors::{Error, PcrError, SessionError};
use tpm2_pcr::hasher::Digest;
use tpm2_pcr::pcr::{PcrExtender, PcrIndex, PcrReader};
use tpm2_pcr::session::{with_session, Session};

fn read(root: &mut MockTrustRoot) -> Result<usize, Error> {
    with_session(root, |session| {
        Ok(PcrReader::read(session, PcrIndex::new(16))?.len())
    })
}

fn extend(root: &mut MockTrustRoot) -> Result<(), Error> {
    let digest = Digest::from(vec![0xAB; common::PCR_SIZE]);
    with_session(root, |session| {
        PcrExtender::extend(session, PcrIndex::new(16), &digest)?;
        Ok(())
    })
}

#[test]
fn open_walks_the_protocol_in_order() {
    let mut root = MockTrustRoot::new();
    assert_eq!(read(&mut root).unwrap(), common::PCR_SIZE);
    assert_eq!(
        root.calls,
        vec![
            Step::CreateContext,
            Step::Connect,
            Step::GetTpmObject,
            Step::PcrRead,
            Step::FreeMemory,
            Step::Close
        ]
    );
}

#[test]
fn context_create_failure_still_tears_down() {
    let mut root = MockTrustRoot::failing_at(Step::CreateContext);
    let err = read(&mut root).unwrap_err();
    assert!(matches!(
        err,
        Error::SessionError(SessionError::ContextCreateFailed(_))
    ));
    assert!(root.teardown_ran_once());
    assert_eq!(root.count(Step::Connect), 0);
}

#[test]
fn connect_failure_still_tears_down() {
    let mut root = MockTrustRoot::failing_at(Step::Connect);
    let err = read(&mut root).unwrap_err();
    assert!(matches!(
        err,
        Error::SessionError(SessionError::ConnectFailed(_))
    ));
    assert!(root.teardown_ran_once());
    assert_eq!(root.count(Step::GetTpmObject), 0);
}

#[test]
fn object_handle_failure_still_tears_down() {
    let mut root = MockTrustRoot::failing_at(Step::GetTpmObject);
    let err = read(&mut root).unwrap_err();
    assert!(matches!(
        err,
        Error::SessionError(SessionError::ObjectHandleFailed(_))
    ));
    assert!(root.teardown_ran_once());
    assert_eq!(root.count(Step::PcrRead), 0);
}

#[test]
fn read_failure_still_tears_down() {
    let mut root = MockTrustRoot::failing_at(Step::PcrRead);
    let err = read(&mut root).unwrap_err();
    match err {
        Error::PcrError(PcrError::ReadFailed { index, source }) => {
            assert_eq!(index, PcrIndex::new(16));
            assert!(source.msg.contains("PcrRead"));
        }
        other => panic!("unexpected error {}", other),
    }
    assert!(root.teardown_ran_once());
}

#[test]
fn extend_failure_still_tears_down() {
    let mut root = MockTrustRoot::failing_at(Step::PcrExtend);
    let err = extend(&mut root).unwrap_err();
    assert!(matches!(
        err,
        Error::PcrError(PcrError::ExtendFailed { .. })
    ));
    assert!(root.teardown_ran_once());
}

#[test]
fn teardown_failure_does_not_fail_a_successful_operation() {
    let mut root = MockTrustRoot::failing_at(Step::Close);
    assert_eq!(read(&mut root).unwrap(), common::PCR_SIZE);
    assert!(root.teardown_ran_once());

    let mut root = MockTrustRoot::failing_at(Step::FreeMemory);
    assert!(read(&mut root).is_ok());
    assert!(root.teardown_ran_once());
}

#[test]
fn teardown_failure_does_not_replace_a_read_failure() {
    let mut root =
        MockTrustRoot::failing_at_all(&[Step::PcrRead, Step::FreeMemory, Step::Close]);
    let err = read(&mut root).unwrap_err();
    match err {
        Error::PcrError(PcrError::ReadFailed { index, source }) => {
            assert_eq!(index, PcrIndex::new(16));
            assert!(source.msg.contains("PcrRead"));
        }
        other => panic!("unexpected error {}", other),
    }
    assert!(root.teardown_ran_once());
}

#[test]
fn teardown_failure_does_not_replace_an_extend_failure() {
    for teardown in [Step::FreeMemory, Step::Close] {
        let mut root = MockTrustRoot::failing_at_all(&[Step::PcrExtend, teardown]);
        let err = extend(&mut root).unwrap_err();
        match err {
            Error::PcrError(PcrError::ExtendFailed { source, .. }) => {
                assert!(source.msg.contains("PcrExtend"));
            }
            other => panic!("unexpected error {} with {:?} failing", other, teardown),
        }
        assert!(root.teardown_ran_once());
    }
}

#[test]
fn teardown_failure_does_not_replace_a_connect_failure() {
    let mut root =
        MockTrustRoot::failing_at_all(&[Step::Connect, Step::FreeMemory, Step::Close]);
    let err = read(&mut root).unwrap_err();
    assert!(matches!(
        err,
        Error::SessionError(SessionError::ConnectFailed(_))
    ));
    assert!(root.teardown_ran_once());
    assert_eq!(root.count(Step::PcrRead), 0);
}

#[test]
fn explicit_close_reports_teardown_failure_once() {
    let mut root = MockTrustRoot::failing_at(Step::FreeMemory);
    {
        let session = Session::open(&mut root).unwrap();
        assert!(matches!(
            session.close(),
            Err(SessionError::TeardownFailed(_))
        ));
    }
    // close still ran after free_memory failed, and drop did not run it again
    assert!(root.teardown_ran_once());
}

#[test]
fn dropped_session_is_torn_down() {
    let mut root = MockTrustRoot::new();
    {
        let mut session = Session::open(&mut root).unwrap();
        PcrReader::read(&mut session, PcrIndex::new(0)).unwrap();
    }
    assert!(root.teardown_ran_once());
    assert!(root.memory.is_empty());
}

#[test]
fn values_are_copied_out_before_teardown() {
    let mut root = MockTrustRoot::new();
    root.pcrs.insert(3, vec![0x33; common::PCR_SIZE]);
    let value = with_session(&mut root, |session| {
        Ok(PcrReader::read(session, PcrIndex::new(3))?)
    })
    .unwrap();
    assert!(root.memory.is_empty());
    assert_eq!(value.as_bytes(), &[0x33; common::PCR_SIZE][..]);
}
