//! Session state machine.
//!
//! [`SessionState::apply`] is a pure transition: it consumes the state and an
//! [`Event`] and returns the next state plus the [`Effect`]s the controller
//! must run. No I/O happens here, which keeps every rule unit-testable.
//!
//! ```text
//! Landing ──SelectPair──▶ Lesson ──Next──▶ Exercise ──last DwellElapsed / Complete──▶ Final
//!    ▲                      │                 │                                         │
//!    └──────────Back────────┴──────Back───────┘                                         │
//!    └────────────────────────────────────Reset────────────────────────────────────────┘
//! ```
//!
//! Inside `Exercise`:
//!
//! ```text
//! Loading ──MaterialLoaded(non-empty)──▶ Ready ──ChooseOption──▶ feedback shown
//!    └─────MaterialLoaded(empty) / MaterialFailed──▶ Failed        │
//!                                          index+1 ◀──DwellElapsed─┘
//! ```
//!
//! Every step change bumps `generation`. Async completions carry the
//! generation they were started under and are dropped when it no longer
//! matches, so a late result can never land in a newer session.

use crate::genai::Exercise;
use crate::lessons::{success_phrase, PhoneticPair, RETRY_PHRASE};

// ---------------------------------------------------------------------------
// Step
// ---------------------------------------------------------------------------

/// Top-level screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Step {
    #[default]
    Landing,
    Lesson,
    Exercise,
    Final,
}

impl Step {
    pub fn label(&self) -> &'static str {
        match self {
            Step::Landing => "Landing",
            Step::Lesson => "Lesson",
            Step::Exercise => "Exercise",
            Step::Final => "Final",
        }
    }
}

// ---------------------------------------------------------------------------
// Exercise session
// ---------------------------------------------------------------------------

/// Generated material for the exercise step.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Material {
    #[default]
    Loading,
    Ready {
        exercises: Vec<Exercise>,
        story: String,
    },
    Failed,
}

/// The correct/incorrect overlay. Present means visible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
    pub correct: bool,
    /// The full word, revealed in the overlay.
    pub word: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExerciseSession {
    pub material: Material,
    pub index: usize,
    pub feedback: Option<Feedback>,
}

// ---------------------------------------------------------------------------
// Events & effects
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    SelectPair(PhoneticPair),
    Next,
    Back,
    /// Explicit skip to the final view; normal play reaches it through the
    /// last `DwellElapsed`.
    Complete,
    Reset,
    MaterialLoaded {
        generation: u64,
        exercises: Vec<Exercise>,
        story: String,
    },
    MaterialFailed {
        generation: u64,
    },
    ChooseOption(String),
    DwellElapsed {
        generation: u64,
    },
}

/// Work the controller performs on behalf of a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Fetch exercises and story for `pair`, reporting back under `generation`.
    LoadMaterial { pair: PhoneticPair, generation: u64 },
    /// Speak `text`.
    Narrate(String),
    /// Emit `DwellElapsed { generation }` after the feedback dwell.
    StartDwell { generation: u64 },
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionState {
    pub step: Step,
    /// `Some` whenever `step` is `Lesson` or `Exercise`.
    pub selected_pair: Option<PhoneticPair>,
    pub exercise: ExerciseSession,
    pub generation: u64,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one event. Events that make no sense for the current state are
    /// ignored (state returned unchanged, no effects).
    pub fn apply(mut self, event: Event) -> (SessionState, Vec<Effect>) {
        let mut effects = Vec::new();
        let from = self.step;

        match (self.step, event) {
            (Step::Landing, Event::SelectPair(pair)) => {
                self.selected_pair = Some(pair);
                self.enter(Step::Lesson);
            }

            (Step::Lesson, Event::Next) => {
                if let Some(pair) = self.selected_pair {
                    self.enter(Step::Exercise);
                    effects.push(Effect::LoadMaterial {
                        pair,
                        generation: self.generation,
                    });
                }
            }

            (Step::Lesson | Step::Exercise, Event::Back) => {
                self.selected_pair = None;
                self.enter(Step::Landing);
            }

            (Step::Exercise, Event::Complete) => self.enter(Step::Final),

            (Step::Final, Event::Reset) => {
                let generation = self.generation;
                self = SessionState::default();
                self.generation = generation + 1;
            }

            (
                Step::Exercise,
                Event::MaterialLoaded {
                    generation,
                    exercises,
                    story,
                },
            ) if self.accepts_material(generation) => {
                self.exercise.material = if exercises.is_empty() {
                    log::warn!("session: material arrived with no exercises");
                    Material::Failed
                } else {
                    Material::Ready { exercises, story }
                };
            }

            (Step::Exercise, Event::MaterialFailed { generation })
                if self.accepts_material(generation) =>
            {
                self.exercise.material = Material::Failed;
            }

            (Step::Exercise, Event::ChooseOption(option)) => {
                if self.exercise.feedback.is_some() {
                    log::debug!("session: option ignored while feedback is visible");
                } else if let Some(current) = self.current_exercise() {
                    if current.options.contains(&option) {
                        let correct = current.is_correct(&option);
                        let word = current.full_word.clone();
                        effects.push(Effect::Narrate(if correct {
                            success_phrase(&word)
                        } else {
                            RETRY_PHRASE.to_string()
                        }));
                        effects.push(Effect::StartDwell {
                            generation: self.generation,
                        });
                        self.exercise.feedback = Some(Feedback { correct, word });
                    }
                }
            }

            (Step::Exercise, Event::DwellElapsed { generation })
                if generation == self.generation && self.exercise.feedback.is_some() =>
            {
                self.exercise.feedback = None;
                if self.exercise.index + 1 < self.exercise_count() {
                    self.exercise.index += 1;
                } else {
                    self.enter(Step::Final);
                }
            }

            (step, event) => {
                log::debug!("session: {event:?} ignored in {}", step.label());
            }
        }

        if from != self.step {
            log::debug!("session: {} → {}", from.label(), self.step.label());
        }
        (self, effects)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn exercises(&self) -> &[Exercise] {
        match &self.exercise.material {
            Material::Ready { exercises, .. } => exercises,
            _ => &[],
        }
    }

    pub fn story(&self) -> Option<&str> {
        match &self.exercise.material {
            Material::Ready { story, .. } => Some(story.as_str()),
            _ => None,
        }
    }

    pub fn exercise_count(&self) -> usize {
        self.exercises().len()
    }

    pub fn current_exercise(&self) -> Option<&Exercise> {
        self.exercises().get(self.exercise.index)
    }

    pub fn is_loading(&self) -> bool {
        self.step == Step::Exercise && self.exercise.material == Material::Loading
    }

    /// Whether a pending timer or fetch may still change the state.
    pub fn is_busy(&self) -> bool {
        self.is_loading() || self.exercise.feedback.is_some()
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn enter(&mut self, step: Step) {
        self.step = step;
        self.generation += 1;
        self.exercise = ExerciseSession::default();
    }

    fn accepts_material(&self, generation: u64) -> bool {
        generation == self.generation && self.exercise.material == Material::Loading
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genai::ImageSource;

    fn exercise(i: usize, word: &str, options: &[&str], correct: &str, full: &str) -> Exercise {
        Exercise {
            id: format!("ex-P-B-{i}"),
            word: word.into(),
            options: options.iter().map(|s| s.to_string()).collect(),
            correct_option: correct.into(),
            full_word: full.into(),
            image: Some(ImageSource::placeholder(full, 400, 300)),
        }
    }

    fn pb_exercises() -> Vec<Exercise> {
        vec![
            exercise(0, "_ATO", &["P", "B"], "P", "PATO"),
            exercise(1, "_OLA", &["P", "B"], "B", "BOLA"),
        ]
    }

    /// Apply a sequence of events, collecting every effect.
    fn run(state: SessionState, events: Vec<Event>) -> (SessionState, Vec<Effect>) {
        events.into_iter().fold((state, Vec::new()), |(s, mut all), e| {
            let (next, effects) = s.apply(e);
            all.extend(effects);
            (next, all)
        })
    }

    /// Landing → Lesson(P-B) → Exercise with material loaded.
    fn ready_session() -> SessionState {
        let (state, _) = run(
            SessionState::new(),
            vec![Event::SelectPair(PhoneticPair::PB), Event::Next],
        );
        let generation = state.generation;
        let (state, _) = state.apply(Event::MaterialLoaded {
            generation,
            exercises: pb_exercises(),
            story: "O pato e a bola.".into(),
        });
        state
    }

    #[test]
    fn initial_state_is_landing() {
        let state = SessionState::new();
        assert_eq!(state.step, Step::Landing);
        assert!(state.selected_pair.is_none());
        assert!(!state.is_busy());
    }

    #[test]
    fn select_pair_opens_lesson() {
        let (state, effects) = SessionState::new().apply(Event::SelectPair(PhoneticPair::FV));
        assert_eq!(state.step, Step::Lesson);
        assert_eq!(state.selected_pair, Some(PhoneticPair::FV));
        assert!(effects.is_empty());
    }

    #[test]
    fn next_from_lesson_loads_material() {
        let (state, effects) = run(
            SessionState::new(),
            vec![Event::SelectPair(PhoneticPair::PB), Event::Next],
        );
        assert_eq!(state.step, Step::Exercise);
        assert!(state.is_loading());
        assert_eq!(
            effects,
            vec![Effect::LoadMaterial {
                pair: PhoneticPair::PB,
                generation: state.generation
            }]
        );
    }

    #[test]
    fn back_clears_selection_from_lesson_and_exercise() {
        let (state, _) = run(
            SessionState::new(),
            vec![Event::SelectPair(PhoneticPair::TD), Event::Back],
        );
        assert_eq!(state.step, Step::Landing);
        assert!(state.selected_pair.is_none());

        let (state, _) = ready_session().apply(Event::Back);
        assert_eq!(state.step, Step::Landing);
        assert!(state.selected_pair.is_none());
        assert!(state.exercises().is_empty());
    }

    #[test]
    fn loaded_material_becomes_ready() {
        let state = ready_session();
        assert!(!state.is_loading());
        assert_eq!(state.exercise_count(), 2);
        assert_eq!(state.current_exercise().unwrap().word, "_ATO");
        assert_eq!(state.story(), Some("O pato e a bola."));
    }

    #[test]
    fn empty_material_counts_as_failed() {
        let (state, _) = run(
            SessionState::new(),
            vec![Event::SelectPair(PhoneticPair::PB), Event::Next],
        );
        let generation = state.generation;
        let (state, _) = state.apply(Event::MaterialLoaded {
            generation,
            exercises: Vec::new(),
            story: String::new(),
        });
        assert_eq!(state.exercise.material, Material::Failed);
        assert!(state.current_exercise().is_none());
    }

    #[test]
    fn material_failure_is_recorded() {
        let (state, _) = run(
            SessionState::new(),
            vec![Event::SelectPair(PhoneticPair::MN), Event::Next],
        );
        let generation = state.generation;
        let (state, _) = state.apply(Event::MaterialFailed { generation });
        assert_eq!(state.exercise.material, Material::Failed);
        assert_eq!(state.step, Step::Exercise);
    }

    #[test]
    fn stale_material_is_ignored() {
        let (state, _) = run(
            SessionState::new(),
            vec![Event::SelectPair(PhoneticPair::PB), Event::Next],
        );
        let stale = state.generation;

        // leave and come back: a new generation is loading
        let (state, _) = run(
            state,
            vec![Event::Back, Event::SelectPair(PhoneticPair::PB), Event::Next],
        );
        assert_ne!(state.generation, stale);

        let (state, _) = state.apply(Event::MaterialLoaded {
            generation: stale,
            exercises: pb_exercises(),
            story: "velha".into(),
        });
        assert!(state.is_loading());
    }

    #[test]
    fn correct_choice_shows_feedback_and_narrates() {
        let (state, effects) = ready_session().apply(Event::ChooseOption("P".into()));
        assert_eq!(
            state.exercise.feedback,
            Some(Feedback {
                correct: true,
                word: "PATO".into()
            })
        );
        assert_eq!(
            effects,
            vec![
                Effect::Narrate("Muito bem! PATO".into()),
                Effect::StartDwell {
                    generation: state.generation
                },
            ]
        );
    }

    #[test]
    fn wrong_choice_narrates_retry() {
        let (state, effects) = ready_session().apply(Event::ChooseOption("B".into()));
        let feedback = state.exercise.feedback.clone().unwrap();
        assert!(!feedback.correct);
        assert_eq!(feedback.word, "PATO");
        assert_eq!(effects[0], Effect::Narrate("Quase lá! Tente de novo.".into()));
    }

    #[test]
    fn choices_are_debounced_while_feedback_visible() {
        let (state, _) = ready_session().apply(Event::ChooseOption("B".into()));
        let (state, effects) = state.apply(Event::ChooseOption("P".into()));
        assert!(effects.is_empty());
        assert!(!state.exercise.feedback.unwrap().correct);
    }

    #[test]
    fn choices_ignored_while_loading_and_for_unknown_options() {
        let (loading, _) = run(
            SessionState::new(),
            vec![Event::SelectPair(PhoneticPair::PB), Event::Next],
        );
        let (state, effects) = loading.clone().apply(Event::ChooseOption("P".into()));
        assert_eq!(state, loading);
        assert!(effects.is_empty());

        let (state, effects) = ready_session().apply(Event::ChooseOption("Z".into()));
        assert!(state.exercise.feedback.is_none());
        assert!(effects.is_empty());
    }

    #[test]
    fn wrong_answer_still_advances_after_dwell() {
        let (state, _) = ready_session().apply(Event::ChooseOption("B".into()));
        let generation = state.generation;
        let (state, _) = state.apply(Event::DwellElapsed { generation });

        assert_eq!(state.exercise.index, 1);
        assert!(state.exercise.feedback.is_none());
        assert_eq!(state.current_exercise().unwrap().full_word, "BOLA");
    }

    #[test]
    fn dwell_after_last_exercise_enters_final() {
        let state = ready_session();
        let generation = state.generation;
        let (state, _) = run(
            state,
            vec![
                Event::ChooseOption("P".into()),
                Event::DwellElapsed { generation },
                Event::ChooseOption("B".into()),
                Event::DwellElapsed { generation },
            ],
        );
        assert_eq!(state.step, Step::Final);
        assert_eq!(state.selected_pair, Some(PhoneticPair::PB));
    }

    #[test]
    fn dwell_without_feedback_or_stale_is_ignored() {
        let state = ready_session();
        let generation = state.generation;
        let (same, _) = state.clone().apply(Event::DwellElapsed { generation });
        assert_eq!(same, state);

        let (state, _) = state.apply(Event::ChooseOption("P".into()));
        let (state, _) = state.apply(Event::DwellElapsed {
            generation: generation - 1,
        });
        assert!(state.exercise.feedback.is_some());
        assert_eq!(state.exercise.index, 0);
    }

    #[test]
    fn complete_and_reset() {
        let (state, _) = ready_session().apply(Event::Complete);
        assert_eq!(state.step, Step::Final);

        let before = state.generation;
        let (state, _) = state.apply(Event::Reset);
        assert_eq!(state.step, Step::Landing);
        assert!(state.selected_pair.is_none());
        assert_eq!(state.exercise, ExerciseSession::default());
        assert!(state.generation > before);
    }

    #[test]
    fn unrelated_events_are_ignored() {
        let landing = SessionState::new();
        for event in [Event::Next, Event::Back, Event::Complete, Event::Reset] {
            let (state, effects) = landing.clone().apply(event);
            assert_eq!(state, landing);
            assert!(effects.is_empty());
        }

        let (lesson, _) = landing.apply(Event::SelectPair(PhoneticPair::SSs));
        let (state, _) = lesson.clone().apply(Event::SelectPair(PhoneticPair::FV));
        assert_eq!(state, lesson);
    }

    #[test]
    fn every_step_change_bumps_generation() {
        let s0 = SessionState::new();
        let (s1, _) = s0.clone().apply(Event::SelectPair(PhoneticPair::PB));
        let (s2, _) = s1.clone().apply(Event::Next);
        let (s3, _) = s2.clone().apply(Event::Back);
        assert!(s0.generation < s1.generation);
        assert!(s1.generation < s2.generation);
        assert!(s2.generation < s3.generation);
    }
}
