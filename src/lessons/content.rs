//! Static lesson text for every [`PhoneticPair`].

use super::PhoneticPair;

/// A word illustrating one side of the contrast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LessonExample {
    pub word: &'static str,
    /// The distinguishing spelling (`"F"`, `"RR"`, ...).
    pub letter: &'static str,
    /// Placeholder illustration URL.
    pub image: &'static str,
}

/// Explanation, tips and examples for one pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LessonContent {
    pub title: &'static str,
    pub pair: PhoneticPair,
    pub explanation: &'static str,
    pub tips: &'static [&'static str],
    pub examples: &'static [LessonExample],
}

impl LessonContent {
    /// Text read aloud by the "Ouvir Lição" button.
    pub fn narration(&self) -> String {
        format!("{}. {}", self.title, self.explanation)
    }
}

/// Instruction shown (and readable aloud) above every exercise.
pub const INSTRUCTION_PHRASE: &str = "Complete a palavra clicando na letra certa!";
/// Prefix of the success phrase; the full word follows.
pub const SUCCESS_PREFIX: &str = "Muito bem!";
/// Spoken after a wrong choice.
pub const RETRY_PHRASE: &str = "Quase lá! Tente de novo.";
/// Spoken on the final screen.
pub const VICTORY_PHRASE: &str =
    "Parabéns! Você completou todos os desafios e agora é um Mestre das Letras!";

/// Success phrase for a resolved word: `"Muito bem! FACA"`.
pub fn success_phrase(full_word: &str) -> String {
    format!("{SUCCESS_PREFIX} {full_word}")
}

const fn example(word: &'static str, letter: &'static str, image: &'static str) -> LessonExample {
    LessonExample {
        word,
        letter,
        image,
    }
}

static FV: LessonContent = LessonContent {
    title: "O Sopro da Fada e a Vibração da Vaca",
    pair: PhoneticPair::FV,
    explanation: "A letra F é um sopro suave (f-f-f), enquanto a letra V faz o nosso pescoço tremer um pouquinho (v-v-v)!",
    tips: &[
        "Coloque a mão na garganta: no V ela vibra, no F não!",
        "F de Faca, V de Vaca.",
    ],
    examples: &[
        example("FACA", "F", "https://picsum.photos/seed/knife/200"),
        example("VACA", "V", "https://picsum.photos/seed/cow/200"),
        example("FOCA", "F", "https://picsum.photos/seed/seal/200"),
        example("VELA", "V", "https://picsum.photos/seed/candle/200"),
    ],
};

static MN: LessonContent = LessonContent {
    title: "A Boca Fechada do Macaco e Aberta do Navio",
    pair: PhoneticPair::MN,
    explanation: "Para falar M, fechamos os lábios bem apertadinhos. Para falar N, a ponta da língua encosta lá no céu da boca!",
    tips: &[
        "M antes de P e B! (Mamãe traz Pão e Bolo)",
        "N antes das outras letras.",
    ],
    examples: &[
        example("MACACO", "M", "https://picsum.photos/seed/monkey/200"),
        example("NAVIO", "N", "https://picsum.photos/seed/ship/200"),
        example("TAMBOR", "M", "https://picsum.photos/seed/drum/200"),
        example("PENTE", "N", "https://picsum.photos/seed/comb/200"),
    ],
};

static PB: LessonContent = LessonContent {
    title: "A Explosão do Pato e do Balão",
    pair: PhoneticPair::PB,
    explanation: "Tanto P quanto B são como pequenas explosões na boca. O P é mais 'seco' e o B tem um som mais 'cheio'.",
    tips: &["O P sai apenas ar.", "O B faz um som que começa lá dentro."],
    examples: &[
        example("PATO", "P", "https://picsum.photos/seed/duck/200"),
        example("BOLA", "B", "https://picsum.photos/seed/ball/200"),
        example("PIPA", "P", "https://picsum.photos/seed/kite/200"),
        example("BOTA", "B", "https://picsum.photos/seed/boot/200"),
    ],
};

static TD: LessonContent = LessonContent {
    title: "O Toque da Tartaruga e o Som do Dado",
    pair: PhoneticPair::TD,
    explanation: "O T e o D são parecidos, mas o T é 'surdo' (sai só ar) e o D é 'sonoro' (as cordas vocais vibram).",
    tips: &["T de Tatu e Teto.", "D de Dado e Dedo."],
    examples: &[
        example("TATU", "T", "https://picsum.photos/seed/armadillo/200"),
        example("DADO", "D", "https://picsum.photos/seed/dice/200"),
        example("TETO", "T", "https://picsum.photos/seed/roof/200"),
        example("DOCE", "D", "https://picsum.photos/seed/candy/200"),
    ],
};

static R_RR: LessonContent = LessonContent {
    title: "O Rato que Rói e o Ronco do Carro",
    pair: PhoneticPair::RRr,
    explanation: "Usamos um R no começo das palavras para o som forte. No meio da palavra, entre vogais, precisamos de dois RR para ser forte!",
    tips: &[
        "R no começo: Rato (som forte).",
        "RR no meio: Carro (som forte).",
        "Um R no meio treme a língua: Arara.",
    ],
    examples: &[
        example("RATO", "R", "https://picsum.photos/seed/mouse/200"),
        example("CARRO", "RR", "https://picsum.photos/seed/car/200"),
        example("RODA", "R", "https://picsum.photos/seed/wheel/200"),
        example("TERRA", "RR", "https://picsum.photos/seed/earth/200"),
    ],
};

static S_SS: LessonContent = LessonContent {
    title: "A Serpente e o Pássaro",
    pair: PhoneticPair::SSs,
    explanation: "O S no começo tem som de 'sssh'. No meio da palavra, para ter esse mesmo som forte entre vogais, usamos SS.",
    tips: &[
        "S no começo: Sapo.",
        "SS no meio: Pássaro.",
        "Um S entre vogais tem som de Z: Casa.",
    ],
    examples: &[
        example("SAPO", "S", "https://picsum.photos/seed/frog/200"),
        example("PÁSSARO", "SS", "https://picsum.photos/seed/bird/200"),
        example("SOL", "S", "https://picsum.photos/seed/sun/200"),
        example("OSSO", "SS", "https://picsum.photos/seed/bone/200"),
    ],
};

/// Lesson for `pair`. Total over the enum.
pub fn lesson(pair: PhoneticPair) -> &'static LessonContent {
    match pair {
        PhoneticPair::FV => &FV,
        PhoneticPair::MN => &MN,
        PhoneticPair::PB => &PB,
        PhoneticPair::TD => &TD,
        PhoneticPair::RRr => &R_RR,
        PhoneticPair::SSs => &S_SS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_pair_has_its_own_lesson() {
        for pair in PhoneticPair::ALL {
            let content = lesson(pair);
            assert_eq!(content.pair, pair);
            assert!(!content.title.is_empty());
            assert!(!content.explanation.is_empty());
            assert!(content.tips.len() >= 2);
            assert_eq!(content.examples.len(), 4);
        }
    }

    #[test]
    fn example_letters_belong_to_the_pair() {
        for pair in PhoneticPair::ALL {
            let letters = pair.letters();
            for ex in lesson(pair).examples {
                assert!(letters.contains(&ex.letter), "{} in {}", ex.letter, pair);
                assert!(ex.word.contains(ex.letter), "{} lacks {}", ex.word, ex.letter);
                assert!(ex.image.starts_with("https://picsum.photos/seed/"));
            }
        }
    }

    #[test]
    fn narration_joins_title_and_explanation() {
        let content = lesson(PhoneticPair::PB);
        assert_eq!(
            content.narration(),
            format!("{}. {}", content.title, content.explanation)
        );
    }

    #[test]
    fn success_phrase_names_the_word() {
        assert_eq!(success_phrase("PATO"), "Muito bem! PATO");
    }
}
