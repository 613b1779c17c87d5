// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the detection-to-capture flow

use qrsnap::backend::PixelFormat;
use qrsnap::errors::PhotoError;
use qrsnap::scanner::filter_qr;
use qrsnap::{
    CameraFrame, Observation, PhotoPipeline, PhotoSink, PromptChoice, PromptController,
    PromptOutcome, PromptState, Symbology,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

fn offer_all(prompts: &mut PromptController, observations: Vec<Observation>) {
    for detection in filter_qr(observations) {
        prompts.offer(detection);
    }
}

#[test]
fn test_only_qr_observations_prompt() {
    let mut prompts = PromptController::new();

    offer_all(
        &mut prompts,
        vec![
            Observation {
                symbology: Symbology::Ean13,
                payload: Some("4006381333931".to_string()),
            },
            Observation {
                symbology: Symbology::Code128,
                payload: Some("ABC-1234".to_string()),
            },
            Observation {
                symbology: Symbology::Qr,
                payload: None,
            },
        ],
    );
    assert_eq!(
        prompts.state(),
        PromptState::NoPrompt,
        "Non-QR and payload-less observations should never prompt"
    );

    offer_all(
        &mut prompts,
        vec![Observation {
            symbology: Symbology::Qr,
            payload: Some("https://example.com".to_string()),
        }],
    );
    assert_eq!(prompts.state(), PromptState::PromptShown);
    assert_eq!(prompts.payload(), Some("https://example.com"));
}

#[test]
fn test_confirm_requests_capture_and_stop() {
    let mut prompts = PromptController::new();
    offer_all(
        &mut prompts,
        vec![Observation {
            symbology: Symbology::Qr,
            payload: Some("WIFI:S:guest;;".to_string()),
        }],
    );

    let outcome = prompts.resolve(PromptChoice::Confirm);
    assert_eq!(outcome, Some(PromptOutcome::CaptureAndStop));
    assert_eq!(prompts.state(), PromptState::NoPrompt);
}

#[test]
fn test_cancel_resumes_scanning() {
    let mut prompts = PromptController::new();
    offer_all(
        &mut prompts,
        vec![Observation {
            symbology: Symbology::Qr,
            payload: Some("hello".to_string()),
        }],
    );

    let outcome = prompts.resolve(PromptChoice::Cancel);
    assert_eq!(outcome, Some(PromptOutcome::Resume));
    assert_eq!(prompts.state(), PromptState::NoPrompt);
    assert_eq!(prompts.payload(), None);
}

#[test]
fn test_same_code_prompts_again_after_cancel() {
    // A code still in view after cancel triggers a fresh prompt on the
    // next frame; nothing suppresses repeats
    let mut prompts = PromptController::new();
    let observation = || {
        vec![Observation {
            symbology: Symbology::Qr,
            payload: Some("persistent-code".to_string()),
        }]
    };

    offer_all(&mut prompts, observation());
    prompts.resolve(PromptChoice::Cancel);
    offer_all(&mut prompts, observation());

    assert_eq!(prompts.state(), PromptState::PromptShown);
    assert_eq!(prompts.prompts_shown(), 2);
}

#[test]
fn test_resolve_without_prompt_is_ignored() {
    let mut prompts = PromptController::new();
    assert_eq!(prompts.resolve(PromptChoice::Confirm), None);
    assert_eq!(prompts.resolve(PromptChoice::Cancel), None);
}

/// Sink that records the order of lifecycle notifications
#[derive(Default)]
struct RecordingSink {
    stages: Vec<String>,
}

impl PhotoSink for RecordingSink {
    fn capture_began(&mut self) {
        self.stages.push("begin".to_string());
    }

    fn will_capture(&mut self) {
        self.stages.push("will-capture".to_string());
    }

    fn did_capture(&mut self) {
        self.stages.push("did-capture".to_string());
    }

    fn capture_finished(&mut self, result: Result<&Path, &PhotoError>) {
        self.stages
            .push(format!("finish:{}", if result.is_ok() { "ok" } else { "err" }));
    }
}

fn test_frame() -> CameraFrame {
    CameraFrame {
        width: 8,
        height: 8,
        data: Arc::from(vec![200u8; 8 * 8 * 4].as_slice()),
        format: PixelFormat::RGBA,
        stride: 32,
        captured_at: Instant::now(),
    }
}

fn temp_dir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("qrsnap-flow-{}-{}", name, std::process::id()))
}

#[tokio::test]
async fn test_confirmed_capture_saves_photo() {
    let dir = temp_dir("confirmed");
    let pipeline = PhotoPipeline::new(dir.clone(), 92);
    let mut sink = RecordingSink::default();

    let path = pipeline
        .capture_and_save(Some(test_frame()), &mut sink)
        .await
        .expect("Capture with a frame available should succeed");

    assert!(path.exists(), "Saved photo should exist on disk");
    assert_eq!(
        sink.stages,
        vec!["begin", "will-capture", "did-capture", "finish:ok"],
        "Lifecycle notifications should arrive in capture order"
    );

    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn test_capture_without_frame_reports_failure() {
    let dir = temp_dir("frameless");
    let pipeline = PhotoPipeline::new(dir.clone(), 92);
    let mut sink = RecordingSink::default();

    let result = pipeline.capture_and_save(None, &mut sink).await;

    assert!(result.is_err(), "Capture without a frame should fail");
    assert_eq!(sink.stages, vec!["begin", "finish:err"]);
    std::fs::remove_dir_all(&dir).ok();
}
