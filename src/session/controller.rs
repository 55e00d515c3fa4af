//! Owns the [`SessionState`] and runs the effects its transitions request.
//!
//! ```text
//! UI click ──dispatch(Event)──▶ SessionState::apply ──▶ Vec<Effect>
//!                                                          │
//!   LoadMaterial ──tokio::spawn──▶ join!(exercises, story) ─┤
//!   StartDwell   ──tokio::spawn──▶ sleep(dwell)            ─┤──▶ mpsc ──poll()──▶ dispatch
//!   Narrate      ──Narrator::play_audio (fire-and-forget)   │
//! ```
//!
//! The state is only ever touched on the thread that owns the controller
//! (the UI thread). Background work reports back through a bounded channel
//! that the UI drains once per frame with [`SessionController::poll`].

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::config::LessonConfig;
use crate::genai::{ExerciseGenerator, NarrationHandle, Narrator, DEFAULT_STORY};
use crate::lessons::PhoneticPair;
use crate::session::state::{Effect, Event, SessionState, Step};

/// Capacity of the completion channel.
const EVENT_CHANNEL_CAPACITY: usize = 32;

pub struct SessionController {
    state: SessionState,
    generator: Arc<ExerciseGenerator>,
    narrator: Arc<Narrator>,
    dwell: Duration,
    events_tx: mpsc::Sender<Event>,
    events_rx: mpsc::Receiver<Event>,
}

impl SessionController {
    /// Must be used inside a tokio runtime context: effects spawn tasks.
    pub fn new(
        generator: Arc<ExerciseGenerator>,
        narrator: Arc<Narrator>,
        lesson: &LessonConfig,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            state: SessionState::new(),
            generator,
            narrator,
            dwell: lesson.feedback_dwell(),
            events_tx,
            events_rx,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Apply `event` and run the resulting effects. Returning to the landing
    /// page silences the tracked narration.
    pub fn dispatch(&mut self, event: Event) {
        let leaving = matches!(event, Event::Back | Event::Reset);
        let state = std::mem::take(&mut self.state);
        let (next, effects) = state.apply(event);
        self.state = next;
        if leaving && self.state.step == Step::Landing {
            self.narrator.stop_current();
        }
        for effect in effects {
            self.run(effect);
        }
    }

    /// Drain completed background work. Returns `true` if anything arrived.
    pub fn poll(&mut self) -> bool {
        let mut changed = false;
        while let Ok(event) = self.events_rx.try_recv() {
            self.dispatch(event);
            changed = true;
        }
        changed
    }

    /// Wait for the next background completion and apply it.
    pub async fn pump(&mut self) {
        if let Some(event) = self.events_rx.recv().await {
            self.dispatch(event);
        }
    }

    /// Speak arbitrary text (tips, lesson, story, masked word).
    pub fn narrate(&self, text: impl Into<String>) -> NarrationHandle {
        self.narrator.play_audio(text)
    }

    // -----------------------------------------------------------------------
    // Effects
    // -----------------------------------------------------------------------

    fn run(&self, effect: Effect) {
        match effect {
            Effect::LoadMaterial { pair, generation } => self.load_material(pair, generation),
            Effect::Narrate(text) => {
                let _ = self.narrator.play_audio(text);
            }
            Effect::StartDwell { generation } => {
                let tx = self.events_tx.clone();
                let dwell = self.dwell;
                tokio::spawn(async move {
                    tokio::time::sleep(dwell).await;
                    let _ = tx.send(Event::DwellElapsed { generation }).await;
                });
            }
        }
    }

    fn load_material(&self, pair: PhoneticPair, generation: u64) {
        let generator = Arc::clone(&self.generator);
        let tx = self.events_tx.clone();

        tokio::spawn(async move {
            log::info!("session: loading material for {pair}");
            let (exercises, story) = tokio::join!(
                generator.generate_exercises(pair),
                generator.generate_fun_story(pair),
            );

            let story = story.unwrap_or_else(|e| {
                log::warn!("session: story generation failed ({e}); using default");
                DEFAULT_STORY.to_string()
            });

            let event = match exercises {
                Ok(exercises) => Event::MaterialLoaded {
                    generation,
                    exercises,
                    story,
                },
                Err(e) => {
                    log::error!("session: exercise generation failed: {e}");
                    Event::MaterialFailed { generation }
                }
            };

            if tx.send(event).await.is_err() {
                log::debug!("session: controller gone; dropping material");
            }
        });
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;

    use super::*;
    use crate::audio::RecordingSink;
    use crate::config::{GenAiConfig, NarrationConfig};
    use crate::genai::client::request_text;
    use crate::genai::{GenAiError, GenerateContentResponse, ImageSource, ScriptedService};
    use crate::session::state::Material;

    const PB_JSON: &str = r#"[
        {"word": "_ATO", "options": ["P", "B"], "correctOption": "P", "fullWord": "PATO"},
        {"word": "_OLA", "options": ["P", "B"], "correctOption": "B", "fullWord": "BOLA"},
        {"word": "_IPOCA", "options": ["P", "B"], "correctOption": "P", "fullWord": "PIPOCA"}
    ]"#;

    #[derive(Clone, Copy)]
    enum Script {
        Healthy,
        StoryFails,
        ExercisesFail,
    }

    fn respond(
        script: Script,
        model: &str,
        text: &str,
    ) -> Result<GenerateContentResponse, GenAiError> {
        let defaults = GenAiConfig::default();
        if model == defaults.speech_model {
            let pcm = STANDARD.encode([0u8, 0, 0, 64]);
            return Ok(GenerateContentResponse::with_inline(
                "audio/L16;codec=pcm;rate=24000",
                &pcm,
            ));
        }
        if model == defaults.image_model {
            return Ok(GenerateContentResponse::with_inline("image/png", "iVBORw0K"));
        }
        if text.contains("exercícios") {
            return match script {
                Script::ExercisesFail => Err(GenAiError::Timeout),
                _ => Ok(GenerateContentResponse::with_text(PB_JSON)),
            };
        }
        match script {
            Script::StoryFails => Err(GenAiError::Request("connection reset".into())),
            _ => Ok(GenerateContentResponse::with_text("O pato Bebeto pulou.")),
        }
    }

    struct Harness {
        controller: SessionController,
        service: Arc<dyn ScriptedCalls>,
        sink: Arc<RecordingSink>,
    }

    /// Lets the harness read recorded calls without naming the closure type.
    trait ScriptedCalls: Send + Sync {
        fn texts_for(&self, model: &str) -> Vec<String>;
    }

    impl<F> ScriptedCalls for ScriptedService<F>
    where
        F: Fn(
                &str,
                &crate::genai::GenerateContentRequest,
            ) -> Result<GenerateContentResponse, GenAiError>
            + Send
            + Sync,
    {
        fn texts_for(&self, model: &str) -> Vec<String> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter(|(m, _)| m == model)
                .map(|(_, req)| request_text(req).to_string())
                .collect()
        }
    }

    fn harness(script: Script) -> Harness {
        harness_with(script, NarrationConfig::default())
    }

    fn harness_with(script: Script, narration: NarrationConfig) -> Harness {
        let service = Arc::new(ScriptedService::new(move |model, req| {
            respond(script, model, request_text(req))
        }));
        let sink = Arc::new(RecordingSink::default());
        let lesson = LessonConfig {
            exercise_count: 3,
            feedback_dwell_ms: 10,
            ..LessonConfig::default()
        };

        let generator = Arc::new(ExerciseGenerator::new(
            service.clone(),
            GenAiConfig::default(),
            lesson.clone(),
        ));
        let narrator = Arc::new(Narrator::new(
            service.clone(),
            sink.clone(),
            GenAiConfig::default(),
            narration,
        ));

        Harness {
            controller: SessionController::new(generator, narrator, &lesson),
            service,
            sink,
        }
    }

    fn speech_texts(h: &Harness) -> Vec<String> {
        h.service.texts_for(&GenAiConfig::default().speech_model)
    }

    #[tokio::test]
    async fn pb_session_end_to_end() {
        let mut h = harness(Script::Healthy);

        h.controller.dispatch(Event::SelectPair(PhoneticPair::PB));
        assert_eq!(h.controller.state().step, Step::Lesson);

        h.controller.dispatch(Event::Next);
        assert!(h.controller.state().is_loading());

        h.controller.pump().await;
        let state = h.controller.state();
        assert_eq!(state.exercise_count(), 3);
        assert_eq!(state.story(), Some("O pato Bebeto pulou."));
        assert!(state
            .exercises()
            .iter()
            .all(|e| matches!(e.image, Some(ImageSource::Generated { .. }))));

        // _ATO → P (correct)
        h.controller.dispatch(Event::ChooseOption("P".into()));
        assert!(h.controller.state().exercise.feedback.as_ref().unwrap().correct);
        h.controller.pump().await;
        assert_eq!(h.controller.state().exercise.index, 1);

        // _OLA → P (wrong) still advances
        h.controller.dispatch(Event::ChooseOption("P".into()));
        assert!(!h.controller.state().exercise.feedback.as_ref().unwrap().correct);
        h.controller.pump().await;
        assert_eq!(h.controller.state().exercise.index, 2);

        // _IPOCA → P (correct), last one
        h.controller.dispatch(Event::ChooseOption("P".into()));
        h.controller.pump().await;
        assert_eq!(h.controller.state().step, Step::Final);

        let spoken = speech_texts(&h);
        assert!(spoken.iter().any(|t| t.ends_with("Muito bem! PATO")));
        assert!(spoken.iter().any(|t| t.ends_with("Quase lá! Tente de novo.")));
        assert!(spoken.iter().any(|t| t.ends_with("Muito bem! PIPOCA")));

        h.controller.dispatch(Event::Reset);
        assert_eq!(h.controller.state().step, Step::Landing);
        assert!(h.controller.state().selected_pair.is_none());
    }

    #[tokio::test]
    async fn back_during_loading_drops_late_material() {
        let mut h = harness(Script::Healthy);

        h.controller.dispatch(Event::SelectPair(PhoneticPair::PB));
        h.controller.dispatch(Event::Next);
        h.controller.dispatch(Event::Back);
        assert_eq!(h.controller.state().step, Step::Landing);
        assert!(h.controller.state().selected_pair.is_none());

        h.controller.pump().await;
        assert_eq!(h.controller.state().step, Step::Landing);
        assert!(h.controller.state().exercises().is_empty());
    }

    #[tokio::test]
    async fn exercise_failure_enters_failed_without_panicking() {
        let mut h = harness(Script::ExercisesFail);

        h.controller.dispatch(Event::SelectPair(PhoneticPair::FV));
        h.controller.dispatch(Event::Next);
        h.controller.pump().await;

        let state = h.controller.state();
        assert_eq!(state.step, Step::Exercise);
        assert_eq!(state.exercise.material, Material::Failed);

        // choosing does nothing; back still works
        h.controller.dispatch(Event::ChooseOption("F".into()));
        assert!(h.controller.state().exercise.feedback.is_none());
        h.controller.dispatch(Event::Back);
        assert_eq!(h.controller.state().step, Step::Landing);
    }

    #[tokio::test]
    async fn story_failure_uses_default_story() {
        let mut h = harness(Script::StoryFails);

        h.controller.dispatch(Event::SelectPair(PhoneticPair::PB));
        h.controller.dispatch(Event::Next);
        h.controller.pump().await;

        assert_eq!(h.controller.state().exercise_count(), 3);
        assert_eq!(h.controller.state().story(), Some(DEFAULT_STORY));
    }

    #[tokio::test]
    async fn poll_without_completions_changes_nothing() {
        let mut h = harness(Script::Healthy);
        assert!(!h.controller.poll());
        assert_eq!(h.controller.state(), &SessionState::new());
    }

    #[tokio::test]
    async fn poll_applies_completed_work() {
        let mut h = harness(Script::Healthy);
        h.controller.dispatch(Event::SelectPair(PhoneticPair::PB));
        h.controller.dispatch(Event::Next);

        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while !h.controller.poll() {
            assert!(tokio::time::Instant::now() < deadline, "material never arrived");
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(h.controller.state().exercise_count(), 3);
    }

    #[tokio::test]
    async fn narrate_passes_text_to_speech_model() {
        let h = harness(Script::Healthy);
        h.controller.narrate("Dica: o F é soprado.").join().await;

        assert!(speech_texts(&h)
            .iter()
            .any(|t| t.ends_with("Dica: o F é soprado.")));
        assert_eq!(h.sink.play_count(), 1);
    }

    #[tokio::test]
    async fn back_to_landing_stops_interruptible_narration() {
        let narration = NarrationConfig {
            interrupt_previous: true,
            ..NarrationConfig::default()
        };
        let mut h = harness_with(Script::Healthy, narration);

        h.controller.dispatch(Event::SelectPair(PhoneticPair::PB));
        h.controller.narrate("Lição do P e do B").join().await;
        assert_eq!(h.sink.play_count(), 1);

        h.controller.dispatch(Event::Back);
        assert_eq!(h.controller.state().step, Step::Landing);
        assert!(h.sink.handles.lock().unwrap()[0].is_stopped());
    }
}
