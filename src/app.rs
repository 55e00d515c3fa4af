//! Mestre das Letras: egui/eframe application.
//!
//! # Architecture
//!
//! [`LetrasApp`] is the top-level [`eframe::App`]. It owns the
//! [`SessionController`] and does three things per frame:
//!
//! 1. `poll()` the controller so finished background work is applied.
//! 2. Render the view for the current [`Step`], collecting at most one
//!    [`Event`] from the user's clicks.
//! 3. `dispatch` that event after rendering (never while the state is
//!    borrowed).
//!
//! Speaker buttons call [`SessionController::narrate`] directly; narration
//! never touches the session state.
//!
//! # Views
//!
//! | Step | Content |
//! |------|---------|
//! | `Landing` | Grid of six pair cards |
//! | `Lesson` | Title, explanation, tips with 🔊, example words, "Vamos jogar!" |
//! | `Exercise` | Loading / failure / image + masked word + options + story |
//! | `Final` | Victory message, "Ouvir Vitória", "Jogar de novo!" |

use std::time::Duration;

use eframe::egui;

use crate::genai::{Exercise, ImageSource};
use crate::lessons::{lesson, PhoneticPair, INSTRUCTION_PHRASE, VICTORY_PHRASE};
use crate::session::{Event, Feedback, Material, SessionController, SessionState, Step};

// ---------------------------------------------------------------------------
// Palette
// ---------------------------------------------------------------------------

const BLUE: egui::Color32 = egui::Color32::from_rgb(30, 64, 175);
const GREEN: egui::Color32 = egui::Color32::from_rgb(21, 128, 61);
const ORANGE: egui::Color32 = egui::Color32::from_rgb(249, 115, 22);
const RED: egui::Color32 = egui::Color32::from_rgb(220, 38, 38);
const YELLOW_BG: egui::Color32 = egui::Color32::from_rgb(254, 252, 232);
const GRAY: egui::Color32 = egui::Color32::from_rgb(107, 114, 128);

/// Repaint cadence while a fetch or feedback dwell is pending.
const BUSY_REPAINT: Duration = Duration::from_millis(100);

// ---------------------------------------------------------------------------
// LetrasApp
// ---------------------------------------------------------------------------

pub struct LetrasApp {
    controller: SessionController,
    /// Shows a hint in the header when generation cannot work.
    has_api_key: bool,
}

impl LetrasApp {
    pub fn new(controller: SessionController, has_api_key: bool) -> Self {
        Self {
            controller,
            has_api_key,
        }
    }

    fn speak(&self, text: impl Into<String>) {
        let _ = self.controller.narrate(text);
    }

    // ── Header / footer ──────────────────────────────────────────────────

    fn draw_header(&self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label(egui::RichText::new("✏").size(32.0));
            ui.label(
                egui::RichText::new("Mestre das Letras")
                    .color(BLUE)
                    .size(30.0)
                    .strong(),
            );
        });
        if !self.has_api_key {
            ui.label(
                egui::RichText::new(
                    "Sem chave de API: defina GEMINI_API_KEY para criar exercícios e áudios.",
                )
                .color(ORANGE)
                .size(12.0),
            );
        }
        ui.separator();
    }

    fn draw_footer(&self, ui: &mut egui::Ui) {
        ui.vertical_centered(|ui| {
            ui.label(
                egui::RichText::new("Feito com carinho para pequenos leitores 📚")
                    .color(GRAY)
                    .size(12.0),
            );
        });
    }

    // ── Landing ──────────────────────────────────────────────────────────

    fn draw_landing(&self, ui: &mut egui::Ui) -> Option<Event> {
        let mut event = None;

        ui.vertical_centered(|ui| {
            ui.add_space(12.0);
            ui.label(
                egui::RichText::new("Escolha sua missão de hoje:")
                    .color(GREEN)
                    .size(26.0),
            );
            ui.add_space(16.0);
        });

        egui::Grid::new("pair-grid")
            .num_columns(3)
            .spacing([16.0, 16.0])
            .show(ui, |ui| {
                for (i, pair) in PhoneticPair::ALL.into_iter().enumerate() {
                    if pair_card(ui, pair).clicked() {
                        event = Some(Event::SelectPair(pair));
                    }
                    if i % 3 == 2 {
                        ui.end_row();
                    }
                }
            });

        event
    }

    // ── Lesson ───────────────────────────────────────────────────────────

    fn draw_lesson(&self, ui: &mut egui::Ui, pair: PhoneticPair) -> Option<Event> {
        let content = lesson(pair);
        let mut event = None;

        ui.horizontal(|ui| {
            if ui.link("← Voltar").clicked() {
                event = Some(Event::Back);
            }
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("🔊 Ouvir Lição").clicked() {
                    self.speak(content.narration());
                }
            });
        });

        ui.add_space(8.0);
        ui.label(egui::RichText::new(content.title).color(GREEN).size(26.0));
        ui.add_space(8.0);

        egui::Frame::group(ui.style()).show(ui, |ui| {
            ui.label(egui::RichText::new(content.explanation).size(18.0));
            ui.add_space(6.0);
            for tip in content.tips {
                ui.horizontal(|ui| {
                    ui.label(egui::RichText::new("✨").color(GREEN));
                    ui.label(egui::RichText::new(*tip).color(GREEN).strong());
                    if ui.small_button("🔊").clicked() {
                        self.speak(*tip);
                    }
                });
            }
        });

        ui.add_space(10.0);
        ui.horizontal_wrapped(|ui| {
            for example in content.examples {
                ui.vertical(|ui| {
                    ui.add(
                        egui::Image::from_uri(example.image).max_size(egui::vec2(120.0, 120.0)),
                    );
                    ui.label(egui::RichText::new(example.word).strong().size(16.0));
                    ui.label(
                        egui::RichText::new(format!("Letra {}", example.letter)).color(GRAY),
                    );
                });
                ui.add_space(8.0);
            }
        });

        ui.add_space(12.0);
        let play = egui::Button::new(
            egui::RichText::new("Vamos jogar! 🚀")
                .size(22.0)
                .color(egui::Color32::WHITE),
        )
        .fill(ORANGE)
        .min_size(egui::vec2(ui.available_width(), 48.0));
        if ui.add(play).clicked() {
            event = Some(Event::Next);
        }

        event
    }

    // ── Exercise ─────────────────────────────────────────────────────────

    fn draw_exercise(&self, ui: &mut egui::Ui, state: &SessionState) -> Option<Event> {
        match &state.exercise.material {
            Material::Loading => {
                ui.vertical_centered(|ui| {
                    ui.add_space(40.0);
                    ui.spinner();
                    ui.add_space(12.0);
                    ui.label(
                        egui::RichText::new(
                            "O artista mágico está pintando os desenhos e preparando os áudios...",
                        )
                        .color(BLUE)
                        .size(20.0),
                    );
                });
                None
            }
            Material::Failed => {
                let mut event = None;
                ui.vertical_centered(|ui| {
                    ui.add_space(40.0);
                    ui.label(
                        egui::RichText::new("Ops! Não conseguimos criar os exercícios agora.")
                            .color(RED)
                            .size(20.0),
                    );
                    ui.label("Verifique a conexão e a chave de API, depois tente de novo.");
                    ui.add_space(12.0);
                    if ui.button("← Voltar").clicked() {
                        event = Some(Event::Back);
                    }
                });
                event
            }
            Material::Ready { exercises, story } => {
                let mut event = None;
                if let Some(exercise) = exercises.get(state.exercise.index) {
                    event = self.draw_current_exercise(
                        ui,
                        exercise,
                        state.exercise.index,
                        exercises.len(),
                        state.exercise.feedback.as_ref(),
                    );
                }
                ui.add_space(12.0);
                self.draw_story(ui, story);
                event
            }
        }
    }

    fn draw_current_exercise(
        &self,
        ui: &mut egui::Ui,
        exercise: &Exercise,
        index: usize,
        count: usize,
        feedback: Option<&Feedback>,
    ) -> Option<Event> {
        let mut event = None;

        ui.horizontal(|ui| {
            if ui.link("← Sair").clicked() {
                event = Some(Event::Back);
            }
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(egui::RichText::new(progress_label(index, count)).color(GRAY));
            });
        });

        ui.horizontal(|ui| {
            ui.label(egui::RichText::new(INSTRUCTION_PHRASE).color(GREEN).size(16.0));
            if ui.small_button("🔊").clicked() {
                self.speak(INSTRUCTION_PHRASE);
            }
        });
        ui.add_space(8.0);

        if let Some(feedback) = feedback {
            draw_feedback(ui, feedback);
        } else {
            ui.vertical_centered(|ui| {
                if let Some(image) = &exercise.image {
                    ui.add(exercise_image(&exercise.id, image).max_size(egui::vec2(360.0, 224.0)));
                }
                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    ui.label(egui::RichText::new(&exercise.word).color(BLUE).size(48.0).strong());
                    if ui.button(egui::RichText::new("🔊").size(24.0)).clicked() {
                        self.speak(exercise.full_word.clone());
                    }
                });
            });
        }

        ui.add_space(12.0);
        ui.columns(exercise.options.len().max(1), |columns| {
            for (column, option) in columns.iter_mut().zip(&exercise.options) {
                let button = egui::Button::new(
                    egui::RichText::new(option)
                        .size(40.0)
                        .color(egui::Color32::WHITE),
                )
                .fill(BLUE)
                .min_size(egui::vec2(column.available_width(), 72.0));
                if column.add_enabled(feedback.is_none(), button).clicked() {
                    event = Some(Event::ChooseOption(option.clone()));
                }
            }
        });

        event
    }

    fn draw_story(&self, ui: &mut egui::Ui, story: &str) {
        egui::Frame::new()
            .fill(YELLOW_BG)
            .corner_radius(egui::CornerRadius::same(12))
            .inner_margin(egui::Margin::same(12))
            .show(ui, |ui| {
                ui.vertical_centered(|ui| {
                    ui.label(egui::RichText::new("História Mágica 📖").strong().size(16.0));
                    ui.label(egui::RichText::new(format!("\"{story}\"")).italics().size(16.0));
                    if ui.button("🔊 Ouvir a História").clicked() {
                        self.speak(story);
                    }
                });
            });
    }

    // ── Final ────────────────────────────────────────────────────────────

    fn draw_final(&self, ui: &mut egui::Ui) -> Option<Event> {
        let mut event = None;
        ui.vertical_centered(|ui| {
            ui.add_space(30.0);
            ui.label(egui::RichText::new("🥇").size(96.0));
            ui.label(
                egui::RichText::new("Uau! Você conseguiu!")
                    .color(BLUE)
                    .size(36.0)
                    .strong(),
            );
            ui.add_space(12.0);
            if ui.button("🔊 Ouvir Vitória").clicked() {
                self.speak(VICTORY_PHRASE);
            }
            ui.add_space(20.0);
            let again = egui::Button::new(
                egui::RichText::new("Jogar de novo! 🎮")
                    .size(22.0)
                    .color(egui::Color32::WHITE),
            )
            .fill(GREEN);
            if ui.add(again).clicked() {
                event = Some(Event::Reset);
            }
        });
        event
    }
}

// ---------------------------------------------------------------------------
// Widgets
// ---------------------------------------------------------------------------

fn pair_card(ui: &mut egui::Ui, pair: PhoneticPair) -> egui::Response {
    let text = egui::RichText::new(format!(
        "{}\n\n{}\nSons de {}",
        pair.emoji(),
        pair.label(),
        pair.label()
    ))
    .size(20.0)
    .color(BLUE);
    ui.add(egui::Button::new(text).min_size(egui::vec2(260.0, 150.0)))
}

fn draw_feedback(ui: &mut egui::Ui, feedback: &Feedback) {
    let (icon, title, color) = if feedback.correct {
        ("🌟", "CORRETO!", GREEN)
    } else {
        ("💡", "OPS!", RED)
    };
    ui.vertical_centered(|ui| {
        ui.add_space(20.0);
        ui.label(egui::RichText::new(icon).size(72.0));
        ui.label(egui::RichText::new(title).color(color).size(40.0).strong());
        ui.label(egui::RichText::new(&feedback.word).size(26.0).strong());
        ui.add_space(20.0);
    });
}

fn exercise_image<'a>(id: &str, image: &'a ImageSource) -> egui::Image<'a> {
    match image {
        ImageSource::Generated {
            mime_type,
            bytes,
            digest,
        } => egui::Image::from_bytes(
            image_uri(id, *digest, mime_type),
            egui::load::Bytes::Shared(bytes.clone()),
        ),
        ImageSource::Placeholder { url } => egui::Image::from_uri(url.as_str()),
    }
}

/// `bytes://` URI under which egui caches a generated image. egui keeps the
/// first bytes registered for a URI, so the payload digest is part of it.
fn image_uri(id: &str, digest: u64, mime_type: &str) -> String {
    let ext = match mime_type {
        "image/jpeg" | "image/jpg" => "jpg",
        _ => "png",
    };
    format!("bytes://{id}-{digest:016x}.{ext}")
}

fn progress_label(index: usize, count: usize) -> String {
    format!("Exercício {} de {}", index + 1, count)
}

// ---------------------------------------------------------------------------
// eframe::App
// ---------------------------------------------------------------------------

impl eframe::App for LetrasApp {
    /// Called every frame by eframe. Applies finished background work, then
    /// renders the current step and dispatches the user's action.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.controller.poll();

        if self.controller.state().is_busy() {
            ctx.request_repaint_after(BUSY_REPAINT);
        }

        let mut event = None;

        egui::TopBottomPanel::top("header").show(ctx, |ui| self.draw_header(ui));
        egui::TopBottomPanel::bottom("footer").show(ctx, |ui| self.draw_footer(ui));

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                let state = self.controller.state();
                event = match (state.step, state.selected_pair) {
                    (Step::Landing, _) => self.draw_landing(ui),
                    (Step::Lesson, Some(pair)) => self.draw_lesson(ui, pair),
                    (Step::Exercise, Some(_)) => self.draw_exercise(ui, state),
                    (Step::Final, _) => self.draw_final(ui),
                    (step, None) => {
                        log::warn!("app: {} without a selected pair", step.label());
                        Some(Event::Back)
                    }
                };
            });
        });

        if let Some(event) = event {
            self.controller.dispatch(event);
            ctx.request_repaint();
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        log::info!("Mestre das Letras closing");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_uri_uses_mime_extension() {
        assert_eq!(image_uri("ex-P-B-0", 0xab, "image/png"), "bytes://ex-P-B-0-00000000000000ab.png");
        assert_eq!(image_uri("ex-P-B-1", 1, "image/jpeg"), "bytes://ex-P-B-1-0000000000000001.jpg");
        assert_eq!(image_uri("ex-P-B-2", 2, ""), "bytes://ex-P-B-2-0000000000000002.png");
        assert_eq!(image_uri("ex-P-B-3", 3, "image/webp"), "bytes://ex-P-B-3-0000000000000003.png");
    }

    #[test]
    fn replayed_exercise_with_new_picture_gets_a_new_uri() {
        let first = ImageSource::generated("image/png", vec![1u8, 1, 1]);
        let replay = ImageSource::generated("image/png", vec![2u8, 2, 2]);
        let ctx = egui::Context::default();
        let uri = |image: &ImageSource| match exercise_image("ex-P-B-0", image).source(&ctx) {
            egui::ImageSource::Bytes { uri, .. } => uri.into_owned(),
            _ => panic!("expected a bytes source"),
        };
        assert_ne!(uri(&first), uri(&replay));
        assert_eq!(uri(&first), uri(&ImageSource::generated("image/png", vec![1u8, 1, 1])));
    }

    #[test]
    fn progress_is_one_based() {
        assert_eq!(progress_label(0, 8), "Exercício 1 de 8");
        assert_eq!(progress_label(7, 8), "Exercício 8 de 8");
    }
}
