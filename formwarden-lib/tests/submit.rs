//! Tests for the submit protocol and the submit helper.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use formwarden_lib::error::SubmitError;
use formwarden_lib::host::{FileAttachment, FormValues, MemoryForm, SubmitState};
use formwarden_lib::rules::{Rule, RuleSet};
use formwarden_lib::submit::{SubmitOptions, SubmitRequest, SubmitResponse, Transport};
use formwarden_lib::{
    FieldError, FormEvent, FormValidator, SubmitOutcome, ValidatorEvent, ValidatorOptions,
};

/// Transport that records requests instead of sending them.
#[derive(Default)]
struct RecordingTransport {
    requests: Mutex<Vec<SubmitRequest>>,
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send(&self, request: SubmitRequest) -> Result<SubmitResponse, SubmitError> {
        self.requests.lock().unwrap().push(request);
        Ok(SubmitResponse {
            status: 200,
            body: "ok".into(),
        })
    }
}

fn email_rules() -> RuleSet {
    RuleSet::new().with("email", [Rule::new(|v, _| v.contains('@'), "invalid email")])
}

#[tokio::test(start_paused = true)]
async fn test_valid_submit_calls_back_once_with_values() {
    let calls = Arc::new(AtomicUsize::new(0));
    let received = Arc::new(Mutex::new(None));
    let (c, r) = (Arc::clone(&calls), Arc::clone(&received));

    let form = Arc::new(MemoryForm::new().with_field("email", ""));
    let options = ValidatorOptions::default().on_valid_submit(move |values| {
        c.fetch_add(1, Ordering::SeqCst);
        *r.lock().unwrap() = Some(values);
    });
    let validator = FormValidator::new(form.clone(), email_rules(), options).unwrap();
    validator.init();

    // Submit before the debounce settles
    form.set_value("email", "a@b.com");
    validator.dispatch(FormEvent::input("email"));
    let outcome = validator.handle_submit().await;

    assert!(outcome.is_valid());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    let values = received.lock().unwrap().clone().unwrap();
    assert_eq!(values.get("email"), Some("a@b.com"));
    assert_eq!(values.len(), 1);

    // The cancelled debounce timer must not fire later
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_invalid_submit_reports_errors_in_order() {
    let reported = Arc::new(Mutex::new(Vec::new()));
    let r = Arc::clone(&reported);

    let form = Arc::new(
        MemoryForm::new()
            .with_field("name", "")
            .with_field("email", "nope"),
    );
    let rules = RuleSet::builder()
        .field("name")
        .required("Name is required")
        .field("email")
        .email("Please enter a valid email")
        .build();
    let options = ValidatorOptions::default()
        .on_valid_submit(|_| panic!("form is invalid"))
        .on_invalid_submit(move |errors| r.lock().unwrap().extend(errors));
    let validator = FormValidator::new(form.clone(), rules, options).unwrap();
    validator.init();

    let outcome = validator.handle_submit().await;
    let expected = vec![
        FieldError::new("name", "Name is required"),
        FieldError::new("email", "Please enter a valid email"),
    ];

    assert_eq!(outcome, SubmitOutcome::Invalid(expected.clone()));
    assert_eq!(outcome.first_error().map(|e| e.field_name.as_str()), Some("name"));
    assert_eq!(*reported.lock().unwrap(), expected);
    assert_eq!(form.group_error("email").as_deref(), Some("Please enter a valid email"));
}

#[tokio::test(start_paused = true)]
async fn test_submit_shows_loading_then_restores() {
    let form = Arc::new(MemoryForm::new().with_field("email", "nope"));
    let validator = FormValidator::new(form.clone(), email_rules(), ValidatorOptions::default()).unwrap();
    validator.init();

    validator.handle_submit().await;

    let history = form.submit_history();
    assert!(history.contains(&SubmitState::Loading));
    assert_eq!(form.submit_state(), SubmitState::Disabled);
    assert!(!validator.is_submitting());

    form.set_value("email", "a@b.com");
    validator.handle_submit().await;
    assert_eq!(form.submit_state(), SubmitState::Enabled);
}

#[tokio::test(start_paused = true)]
async fn test_reentrant_submit_is_ignored() {
    let calls = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&calls);

    let form = Arc::new(MemoryForm::new().with_field("username", "ana"));
    let rules = RuleSet::new().with(
        "username",
        [Rule::new_async(
            |_, _| async {
                tokio::time::sleep(Duration::from_millis(200)).await;
                true
            },
            "Username taken",
        )],
    );
    let options = ValidatorOptions::default().on_valid_submit(move |_| {
        c.fetch_add(1, Ordering::SeqCst);
    });
    let validator = FormValidator::new(form.clone(), rules, options).unwrap();
    validator.init();

    let (first, second) = tokio::join!(validator.handle_submit(), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(validator.is_submitting());
        validator.handle_submit().await
    });

    assert!(first.is_valid());
    assert!(second.is_ignored());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(!validator.is_submitting());
}

#[tokio::test(start_paused = true)]
async fn test_submit_during_in_flight_source_check_accepts_valid_form() {
    let rejected = Arc::new(Mutex::new(None));
    let r = Arc::clone(&rejected);

    let form = Arc::new(MemoryForm::new().with_field("a", "x").with_field("b", "y"));
    let rules = RuleSet::new()
        .with(
            "a",
            [Rule::new_async(
                |_, _| async {
                    tokio::time::sleep(Duration::from_millis(100)).await;
                    true
                },
                "a rejected",
            )],
        )
        .with(
            "b",
            [
                Rule::new_async(
                    |_, _| async {
                        tokio::time::sleep(Duration::from_millis(150)).await;
                        true
                    },
                    "b rejected",
                ),
                Rule::new(|_, _| true, "b needs a").depends_on(["a"]),
            ],
        );
    let options = ValidatorOptions::default().on_invalid_submit(move |errors| {
        *r.lock().unwrap() = Some(errors);
    });
    let validator = FormValidator::new(form.clone(), rules, options).unwrap();
    validator.init();

    // The debounced check of "a" is still running when submit supersedes it
    validator.dispatch(FormEvent::input("a"));
    tokio::time::sleep(Duration::from_millis(550)).await;
    assert!(validator.is_pending("a"));

    let outcome = validator.handle_submit().await;

    assert!(outcome.is_valid(), "unexpected outcome: {outcome:?}");
    assert!(rejected.lock().unwrap().is_none());
    assert!(validator.is_form_valid());
}

#[tokio::test(start_paused = true)]
async fn test_submit_event_runs_in_background() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let e = Arc::clone(&events);

    let form = Arc::new(MemoryForm::new().with_field("email", "a@b.com"));
    let validator = FormValidator::new(form.clone(), email_rules(), ValidatorOptions::default()).unwrap();
    validator.subscribe(move |event| {
        if matches!(event, ValidatorEvent::ValidSubmit | ValidatorEvent::InvalidSubmit { .. }) {
            e.lock().unwrap().push(event.clone());
        }
    });
    validator.init();

    validator.dispatch(FormEvent::Submit);
    tokio::time::sleep(Duration::from_millis(1)).await;

    assert_eq!(*events.lock().unwrap(), vec![ValidatorEvent::ValidSubmit]);
}

#[tokio::test(start_paused = true)]
async fn test_dropped_submit_clears_loading() {
    let form = Arc::new(MemoryForm::new().with_field("username", "ana"));
    let rules = RuleSet::new().with(
        "username",
        [Rule::new_async(
            |_, _| async {
                tokio::time::sleep(Duration::from_secs(10)).await;
                true
            },
            "Username taken",
        )],
    );
    let validator = FormValidator::new(form.clone(), rules, ValidatorOptions::default()).unwrap();
    validator.init();

    let timed_out = tokio::time::timeout(Duration::from_millis(100), validator.handle_submit()).await;
    assert!(timed_out.is_err());
    assert!(!validator.is_submitting());
    assert_ne!(form.submit_state(), SubmitState::Loading);
}

#[tokio::test]
async fn test_submit_helper_uses_transport() {
    let transport = Arc::new(RecordingTransport::default());
    let form = Arc::new(
        MemoryForm::new()
            .with_field("email", "a@b.com")
            .with_field("avatar", ""),
    );
    form.attach_file(
        "avatar",
        FileAttachment::new("me.png", vec![0x89, 0x50]).with_content_type("image/png"),
    );
    let validator = FormValidator::new(
        form.clone(),
        email_rules(),
        ValidatorOptions::default().with_transport(transport.clone()),
    )
    .unwrap();

    let response = validator
        .submit(
            "https://example.com/api/contact",
            SubmitOptions::default()
                .method(reqwest::Method::PUT)
                .header("X-Requested-With", "formwarden"),
        )
        .await
        .unwrap();
    assert!(response.is_success());

    let requests = transport.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.url.as_str(), "https://example.com/api/contact");
    assert_eq!(request.options.method, reqwest::Method::PUT);
    assert_eq!(
        request.options.headers,
        vec![("X-Requested-With".to_string(), "formwarden".to_string())]
    );
    assert_eq!(request.values.get("email"), Some("a@b.com"));
    let files: Vec<&FileAttachment> = request.values.files_of("avatar").collect();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].file_name, "me.png");
}

#[tokio::test]
async fn test_submit_helper_rejects_bad_url() {
    let transport = Arc::new(RecordingTransport::default());
    let form = Arc::new(MemoryForm::new().with_field("email", "a@b.com"));
    let validator = FormValidator::new(
        form,
        email_rules(),
        ValidatorOptions::default().with_transport(transport.clone()),
    )
    .unwrap();

    let err = validator
        .submit("not a url", SubmitOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, SubmitError::InvalidUrl(_)));
    assert!(transport.requests.lock().unwrap().is_empty());
}

#[test]
fn test_form_values_serialize_as_object() {
    let mut values = FormValues::new();
    values.insert("email", "a@b.com");
    values.insert("name", "Ana");

    let json = serde_json::to_value(&values).unwrap();
    assert_eq!(json, serde_json::json!({ "email": "a@b.com", "name": "Ana" }));
}
