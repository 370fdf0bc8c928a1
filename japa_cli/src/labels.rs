//! Display strings for the supported languages.

use japa_core::Language;

pub struct Labels {
    pub today: &'static str,
    pub lifetime: &'static str,
    pub malas: &'static str,
    pub selected: &'static str,
    pub no_mantras: &'static str,
    pub added: &'static str,
    pub deleted: &'static str,
    pub mala_complete: &'static str,
    pub confirm_delete: &'static str,
    pub confirm_reset: &'static str,
    pub reset_done: &'static str,
    pub cancelled: &'static str,
    pub sound_on: &'static str,
    pub sound_off: &'static str,
    pub language_set: &'static str,
}

const EN: Labels = Labels {
    today: "today",
    lifetime: "lifetime",
    malas: "malas",
    selected: "selected",
    no_mantras: "No mantras yet. Add one with: japa add <name>",
    added: "Added mantra",
    deleted: "Deleted mantra",
    mala_complete: "Mala complete!",
    confirm_delete: "Delete this mantra and all its counts? [y/N] ",
    confirm_reset: "Reset current mala progress? [y/N] ",
    reset_done: "Current mala reset",
    cancelled: "Cancelled",
    sound_on: "Sound on",
    sound_off: "Sound off",
    language_set: "Language set to English",
};

const HI: Labels = Labels {
    today: "आज",
    lifetime: "कुल",
    malas: "माला",
    selected: "चयनित",
    no_mantras: "अभी कोई मंत्र नहीं। जोड़ें: japa add <नाम>",
    added: "मंत्र जोड़ा गया",
    deleted: "मंत्र हटाया गया",
    mala_complete: "माला पूर्ण!",
    confirm_delete: "यह मंत्र और इसकी सारी गिनती हटाएँ? [y/N] ",
    confirm_reset: "वर्तमान माला की प्रगति रीसेट करें? [y/N] ",
    reset_done: "वर्तमान माला रीसेट हुई",
    cancelled: "रद्द किया गया",
    sound_on: "ध्वनि चालू",
    sound_off: "ध्वनि बंद",
    language_set: "भाषा हिंदी पर सेट",
};

pub fn labels(language: Language) -> &'static Labels {
    match language {
        Language::En => &EN,
        Language::Hi => &HI,
    }
}
