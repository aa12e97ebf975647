//! One perception call: instruction, model, extraction, reconciliation.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::{
    model::PerceptionSnapshot,
    prompt::perception_instruction,
    reconcile::{Reconciliation, reconcile},
};
use crate::{
    core::Size,
    error::TutorResult,
    gateway::{EncodedImage, ModelGateway, extract_json},
};

/// Perception pass over one encoded frame.
pub struct PerceptionAgent {
    gateway: Arc<dyn ModelGateway>,
    max_output_tokens: u32,
}

impl PerceptionAgent {
    pub fn new(gateway: Arc<dyn ModelGateway>, max_output_tokens: u32) -> Self {
        Self {
            gateway,
            max_output_tokens,
        }
    }

    /// Ask the model about `image` and merge its reply onto `previous`.
    ///
    /// Gateway failures are returned as errors; an unusable reply comes back
    /// as [`Reconciliation::Rejected`].
    pub fn observe(
        &self,
        image: &EncodedImage,
        frame_size: Size,
        previous: Option<&PerceptionSnapshot>,
        feedback: Option<&str>,
        received_at: DateTime<Utc>,
    ) -> TutorResult<Reconciliation> {
        let instruction = perception_instruction(previous, feedback);
        let reply = self
            .gateway
            .call(Some(image), &instruction, self.max_output_tokens)?;
        log::debug!("perception reply: {}", reply);

        let raw = extract_json(&reply);
        Ok(reconcile(previous, raw.as_ref(), frame_size, received_at))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::TutorError, perception::RejectReason};
    use std::sync::Mutex;

    struct OneReply(Mutex<Option<TutorResult<String>>>);

    impl ModelGateway for OneReply {
        fn call(&self, _: Option<&EncodedImage>, _: &str, _: u32) -> TutorResult<String> {
            self.0
                .lock()
                .unwrap()
                .take()
                .unwrap_or_else(|| Err(TutorError::transport("test", "exhausted")))
        }
    }

    fn image() -> EncodedImage {
        EncodedImage {
            data_uri: "data:image/jpeg;base64,".into(),
            size: Size { w: 100, h: 100 },
            jpeg_bytes: 0,
        }
    }

    fn agent(reply: TutorResult<String>) -> PerceptionAgent {
        PerceptionAgent::new(Arc::new(OneReply(Mutex::new(Some(reply)))), 100)
    }

    #[test]
    fn test_fenced_reply_merged() {
        let agent = agent(Ok("```json\n{\"page_id\": \"2\", \"is_writing\": true,}\n```".into()));
        let result = agent
            .observe(&image(), Size { w: 100, h: 100 }, None, None, Utc::now())
            .unwrap();
        match result {
            Reconciliation::Merged(snapshot) => {
                assert_eq!(snapshot.page_id.as_deref(), Some("page2"));
                assert!(snapshot.is_writing_now());
            }
            other => panic!("expected merge, got {:?}", other),
        }
    }

    #[test]
    fn test_prose_reply_rejected() {
        let agent = agent(Ok("I cannot see a workbook.".into()));
        let result = agent
            .observe(&image(), Size { w: 100, h: 100 }, None, None, Utc::now())
            .unwrap();
        assert_eq!(result, Reconciliation::Rejected(RejectReason::MissingPayload));
    }

    #[test]
    fn test_transport_error_propagates() {
        let agent = agent(Err(TutorError::timeout("chat_completions", "60s")));
        let err = agent
            .observe(&image(), Size { w: 100, h: 100 }, None, None, Utc::now())
            .unwrap_err();
        assert_eq!(err.category(), "transport");
    }
}
