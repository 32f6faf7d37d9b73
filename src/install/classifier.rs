/// Phase markers printed by the installer, in the order they are checked.
///
/// The first marker found in a line decides its percentage. Nothing here
/// enforces that percentages only go up: an installer that retries a phase
/// will report a lower value again.
pub const PHASE_MARKERS: [(&str, u8); 8] = [
    ("Partitionnement", 10),
    ("Formatage", 20),
    ("Montage", 30),
    ("Installation du système de base", 50),
    ("Configuration du système", 70),
    ("Installation de l'environnement de bureau", 85),
    ("Finalisation", 95),
    ("Installation terminée", 100),
];

/// Map one line of installer output to a progress percentage, if it carries a phase marker
pub fn classify(line: &str) -> Option<u8> {
    PHASE_MARKERS
        .iter()
        .find(|(marker, _)| line.contains(marker))
        .map(|&(_, percent)| percent)
}
