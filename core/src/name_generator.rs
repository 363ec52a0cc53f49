//! Deterministic name generation using curated name lists.
//!
//! Provides trade names for companies and display names for
//! external-network wallet holders. All generation is deterministic
//! (same RNG seed = same names).

use crate::rng::PhaseRng;

/// Deterministic name generator using curated name lists
pub struct NameGenerator;

impl NameGenerator {
    /// Generate a full name (first + last) deterministically
    pub fn generate_full_name(rng: &mut PhaseRng) -> String {
        let first_name = Self::generate_first_name(rng);
        let last_name = Self::generate_last_name(rng);
        format!("{} {}", first_name, last_name)
    }

    pub fn generate_first_name(rng: &mut PhaseRng) -> &'static str {
        *rng.pick(Self::first_names())
    }

    pub fn generate_last_name(rng: &mut PhaseRng) -> &'static str {
        *rng.pick(Self::last_names())
    }

    /// Generate a trade name ("nombre comercial") for a company
    pub fn generate_trade_name(rng: &mut PhaseRng, sector: &str) -> String {
        let prefix = *rng.pick(Self::business_prefixes());
        let suffix = *rng.pick(Self::business_suffixes());

        // Format: "Prefix Sector Suffix" or "LastName Sector Suffix"
        if rng.chance(0.5) {
            format!("{} {} {}", prefix, sector, suffix)
        } else {
            format!("{} {} {}", Self::generate_last_name(rng), sector, suffix)
        }
    }

    fn first_names() -> &'static [&'static str] {
        &[
            "José", "Luis", "Carlos", "Juan", "Jorge", "Miguel", "Víctor", "César",
            "Jesús", "Manuel", "Pedro", "Alberto", "Ricardo", "Fernando", "Javier",
            "Daniel", "Óscar", "Raúl", "Alejandro", "Eduardo", "Martín", "Diego",
            "Renzo", "Piero", "Gonzalo", "Hugo", "Walter", "Julio", "Héctor", "Iván",
            "María", "Rosa", "Ana", "Carmen", "Juana", "Luz", "Elizabeth", "Patricia",
            "Julia", "Milagros", "Gladys", "Sofía", "Lucía", "Valeria", "Camila",
            "Daniela", "Andrea", "Gabriela", "Fiorella", "Ximena", "Claudia", "Diana",
            "Karla", "Mariela", "Verónica", "Silvia", "Teresa", "Flor", "Norma", "Rocío",
        ]
    }

    fn last_names() -> &'static [&'static str] {
        &[
            "Quispe", "Flores", "Sánchez", "Rodríguez", "García", "Rojas", "Mamani",
            "Huamán", "Gonzales", "Chávez", "Vásquez", "Ramos", "Ramírez", "Torres",
            "Díaz", "Mendoza", "Castillo", "Espinoza", "Vargas", "López", "Pérez",
            "Fernández", "Gutiérrez", "Ruiz", "Castro", "Cruz", "Romero", "Salazar",
            "Córdova", "Ríos", "Herrera", "Medina", "Aguilar", "Morales", "Reyes",
            "Ccori", "Condori", "Paredes", "Silva", "Vega", "Cárdenas", "Campos",
            "Huanca", "Ticona", "Soto", "Cabrera", "Palomino", "Rivera", "Núñez",
        ]
    }

    fn business_prefixes() -> &'static [&'static str] {
        &[
            "Inversiones", "Comercial", "Distribuidora", "Corporación", "Grupo",
            "Negocios", "Servicios", "Importaciones", "Multiservicios", "Andina",
            "Pacífico", "Inca", "Lima", "Norte", "Sur",
        ]
    }

    fn business_suffixes() -> &'static [&'static str] {
        &["SAC", "SRL", "EIRL", "SA", "SAA"]
    }
}
