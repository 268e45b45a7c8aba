use super::*;
use crate::gateway::GatewayError;
use crate::testutil::ScriptedGateway;

const TICK: Duration = Duration::from_millis(40);

fn pump_until<F: Fn(&PreviewLoop) -> bool>(preview: &mut PreviewLoop, pred: F) {
    let deadline = Instant::now() + Duration::from_secs(2);
    loop {
        preview.pump();
        if pred(preview) {
            return;
        }
        assert!(Instant::now() < deadline, "timed out waiting for state");
        thread::sleep(Duration::from_millis(5));
    }
}

#[test]
fn a_missing_artifact_reads_as_not_ready_not_as_an_error() {
    let gateway = Arc::new(ScriptedGateway::new());
    // Script empty: every poll falls through to Processing.
    let mut preview = PreviewLoop::start(
        gateway.clone() as Arc<dyn MaskGateway>,
        MaskId("7".to_string()),
        TICK,
    );

    pump_until(&mut preview, |p| *p.state() == PreviewState::NotReady);
    preview.stop();
}

#[test]
fn a_ready_artifact_replaces_the_preview_wholesale() {
    let gateway = Arc::new(ScriptedGateway::new());
    {
        let mut script = gateway.poll_script.lock().expect("script lock");
        script.push_back(Ok(JobArtifact::Ready {
            html: "<p>one</p>".to_string(),
        }));
        script.push_back(Ok(JobArtifact::Ready {
            html: "<p>two</p>".to_string(),
        }));
    }

    let mut preview = PreviewLoop::start(
        gateway.clone() as Arc<dyn MaskGateway>,
        MaskId("7".to_string()),
        TICK,
    );

    // The kept markup tracks the newest render, old content fully replaced.
    pump_until(&mut preview, |p| p.html() == Some("<p>one</p>"));
    pump_until(&mut preview, |p| p.html() == Some("<p>two</p>"));
    preview.stop();
}

#[test]
fn errors_do_not_end_the_loop() {
    let gateway = Arc::new(ScriptedGateway::new());
    {
        let mut script = gateway.poll_script.lock().expect("script lock");
        script.push_back(Err(GatewayError::Transport("down".to_string())));
        script.push_back(Ok(JobArtifact::Ready {
            html: "<p>back</p>".to_string(),
        }));
    }

    // A long interval keeps the error state observable before the next tick.
    let mut preview = PreviewLoop::start(
        gateway.clone() as Arc<dyn MaskGateway>,
        MaskId("7".to_string()),
        Duration::from_millis(200),
    );

    pump_until(&mut preview, |p| {
        matches!(p.state(), PreviewState::Error(_))
    });
    // The next tick still happens and recovers.
    pump_until(&mut preview, |p| p.html() == Some("<p>back</p>"));
    preview.stop();
}

#[test]
fn a_completed_job_without_markup_is_an_error_state() {
    let gateway = Arc::new(ScriptedGateway::new());
    gateway
        .poll_script
        .lock()
        .expect("script lock")
        .push_back(Ok(JobArtifact::Failed));

    let mut preview = PreviewLoop::start(
        gateway.clone() as Arc<dyn MaskGateway>,
        MaskId("7".to_string()),
        Duration::from_millis(200),
    );

    pump_until(&mut preview, |p| {
        matches!(p.state(), PreviewState::Error(_))
    });
    preview.stop();
}

#[test]
fn ticks_are_paced_by_the_interval() {
    let gateway = Arc::new(ScriptedGateway::new());
    let mut preview = PreviewLoop::start(
        gateway.clone() as Arc<dyn MaskGateway>,
        MaskId("7".to_string()),
        Duration::from_millis(300),
    );

    // The first fetch is immediate; the second waits for the interval.
    pump_until(&mut preview, |p| *p.state() == PreviewState::NotReady);
    assert_eq!(gateway.poll_count.load(std::sync::atomic::Ordering::SeqCst), 1);

    thread::sleep(Duration::from_millis(450));
    assert_eq!(gateway.poll_count.load(std::sync::atomic::Ordering::SeqCst), 2);
    preview.stop();
}

#[test]
fn stop_prevents_any_later_transition() {
    use std::sync::{Mutex, mpsc};

    use crate::model::{MaskDetail, MaskRecord, MaskSubmission, UserId, UserProfile};

    // Holds the in-flight fetch until the test releases it after stop().
    struct HeldPoll {
        entered: Mutex<mpsc::Sender<()>>,
        release: Mutex<Option<mpsc::Receiver<()>>>,
    }

    impl MaskGateway for HeldPoll {
        fn list_masks(&self) -> Result<Vec<MaskRecord>, GatewayError> {
            unimplemented!("not exercised")
        }
        fn create_mask(
            &self,
            _owner: &UserId,
            _submission: &MaskSubmission,
        ) -> Result<MaskRecord, GatewayError> {
            unimplemented!("not exercised")
        }
        fn rename_mask(&self, _id: &MaskId, _mask_name: &str) -> Result<(), GatewayError> {
            unimplemented!("not exercised")
        }
        fn delete_mask(&self, _id: &MaskId) -> Result<(), GatewayError> {
            unimplemented!("not exercised")
        }
        fn load_detail(&self, _id: &MaskId) -> Result<MaskDetail, GatewayError> {
            unimplemented!("not exercised")
        }
        fn update_detail(
            &self,
            _id: &MaskId,
            _submission: &MaskSubmission,
        ) -> Result<(), GatewayError> {
            unimplemented!("not exercised")
        }
        fn poll_job(&self, _id: &MaskId) -> Result<JobArtifact, GatewayError> {
            self.entered
                .lock()
                .expect("entered lock")
                .send(())
                .expect("signal entry");
            if let Some(release) = self.release.lock().expect("release lock").take() {
                release.recv().expect("wait for release");
            }
            Ok(JobArtifact::Ready {
                html: "<p>late</p>".to_string(),
            })
        }
        fn resolve_profile(&self, _user_id: &UserId) -> Result<UserProfile, GatewayError> {
            unimplemented!("not exercised")
        }
    }

    let (entered_tx, entered_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();
    let gateway = Arc::new(HeldPoll {
        entered: Mutex::new(entered_tx),
        release: Mutex::new(Some(release_rx)),
    });

    let mut preview = PreviewLoop::start(
        gateway.clone() as Arc<dyn MaskGateway>,
        MaskId("7".to_string()),
        TICK,
    );

    // The first fetch is now in flight; stop while it is unresolved.
    entered_rx.recv().expect("fetch entered");
    preview.stop();
    assert_eq!(*preview.state(), PreviewState::Idle);

    // Let the held fetch resolve Ready, then give it time to land.
    release_tx.send(()).expect("release fetch");
    thread::sleep(Duration::from_millis(80));

    preview.pump();
    assert_eq!(*preview.state(), PreviewState::Idle);
    assert_eq!(preview.html(), None);
}
