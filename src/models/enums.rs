//! Enums for the outage schema and load actions
//!
//! `CanonicalField` uses `SCREAMING_SNAKE_CASE` so the serialized names match
//! the column names of the destination table.

use serde::{Deserialize, Serialize};

/// Value type of a canonical column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Timestamp,
    Number,
}

/// Columns of the canonical outage schema
///
/// The first eighteen variants are the columns a source worksheet may carry.
/// `ArchivoOrigen`, `FechaActualizacion` and `FechaCarga` are attached by the
/// loader and the store and never read from a spreadsheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CanonicalField {
    FechaHoraApertura,
    FechaHoraCierre,
    DuracionIndisponibilidadMinutos,
    CargaMegas,
    CodigoElementoAfectado,
    TipoEquipo,
    CircuitosAfectados,
    Subestacion,
    Region,
    CodigoInterruptor,
    NivelDeTension,
    ProteccionOperada,
    OrigenIndisponibilidad,
    CausaEvento,
    Excepciones,
    TipoIndisponibilidad,
    TipoMantenimiento,
    DescripcionEvento,
    ArchivoOrigen,
    FechaActualizacion,
    FechaCarga,
}

impl CanonicalField {
    /// Columns that can come from a source worksheet, in table order
    pub const SOURCE: [CanonicalField; 18] = [
        CanonicalField::FechaHoraApertura,
        CanonicalField::FechaHoraCierre,
        CanonicalField::DuracionIndisponibilidadMinutos,
        CanonicalField::CargaMegas,
        CanonicalField::CodigoElementoAfectado,
        CanonicalField::TipoEquipo,
        CanonicalField::CircuitosAfectados,
        CanonicalField::Subestacion,
        CanonicalField::Region,
        CanonicalField::CodigoInterruptor,
        CanonicalField::NivelDeTension,
        CanonicalField::ProteccionOperada,
        CanonicalField::OrigenIndisponibilidad,
        CanonicalField::CausaEvento,
        CanonicalField::Excepciones,
        CanonicalField::TipoIndisponibilidad,
        CanonicalField::TipoMantenimiento,
        CanonicalField::DescripcionEvento,
    ];

    /// Columns written by a bulk insert, in insert order (`FECHA_CARGA` is
    /// stamped by the store)
    pub const PERSISTED: [CanonicalField; 20] = [
        CanonicalField::FechaHoraApertura,
        CanonicalField::FechaHoraCierre,
        CanonicalField::DuracionIndisponibilidadMinutos,
        CanonicalField::CargaMegas,
        CanonicalField::CodigoElementoAfectado,
        CanonicalField::TipoEquipo,
        CanonicalField::CircuitosAfectados,
        CanonicalField::Subestacion,
        CanonicalField::Region,
        CanonicalField::CodigoInterruptor,
        CanonicalField::NivelDeTension,
        CanonicalField::ProteccionOperada,
        CanonicalField::OrigenIndisponibilidad,
        CanonicalField::CausaEvento,
        CanonicalField::Excepciones,
        CanonicalField::TipoIndisponibilidad,
        CanonicalField::TipoMantenimiento,
        CanonicalField::DescripcionEvento,
        CanonicalField::ArchivoOrigen,
        CanonicalField::FechaActualizacion,
    ];

    /// Column name in the destination table
    pub fn column_name(self) -> &'static str {
        match self {
            CanonicalField::FechaHoraApertura => "FECHA_HORA_APERTURA",
            CanonicalField::FechaHoraCierre => "FECHA_HORA_CIERRE",
            CanonicalField::DuracionIndisponibilidadMinutos => "DURACION_INDISPONIBILIDAD_MINUTOS",
            CanonicalField::CargaMegas => "CARGA_MEGAS",
            CanonicalField::CodigoElementoAfectado => "CODIGO_ELEMENTO_AFECTADO",
            CanonicalField::TipoEquipo => "TIPO_EQUIPO",
            CanonicalField::CircuitosAfectados => "CIRCUITOS_AFECTADOS",
            CanonicalField::Subestacion => "SUBESTACION",
            CanonicalField::Region => "REGION",
            CanonicalField::CodigoInterruptor => "CODIGO_INTERRUPTOR",
            CanonicalField::NivelDeTension => "NIVEL_DE_TENSION",
            CanonicalField::ProteccionOperada => "PROTECCION_OPERADA",
            CanonicalField::OrigenIndisponibilidad => "ORIGEN_INDISPONIBILIDAD",
            CanonicalField::CausaEvento => "CAUSA_EVENTO",
            CanonicalField::Excepciones => "EXCEPCIONES",
            CanonicalField::TipoIndisponibilidad => "TIPO_INDISPONIBILIDAD",
            CanonicalField::TipoMantenimiento => "TIPO_MANTENIMIENTO",
            CanonicalField::DescripcionEvento => "DESCRIPCION_EVENTO",
            CanonicalField::ArchivoOrigen => "ARCHIVO_ORIGEN",
            CanonicalField::FechaActualizacion => "FECHA_ACTUALIZACION",
            CanonicalField::FechaCarga => "FECHA_CARGA",
        }
    }

    /// Look up a source column by its canonical name
    pub fn from_source_name(name: &str) -> Option<Self> {
        Self::SOURCE.into_iter().find(|f| f.column_name() == name)
    }

    pub fn kind(self) -> FieldKind {
        match self {
            CanonicalField::FechaHoraApertura
            | CanonicalField::FechaHoraCierre
            | CanonicalField::FechaActualizacion
            | CanonicalField::FechaCarga => FieldKind::Timestamp,
            CanonicalField::DuracionIndisponibilidadMinutos | CanonicalField::CargaMegas => {
                FieldKind::Number
            }
            _ => FieldKind::Text,
        }
    }
}

impl std::fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.column_name())
    }
}

/// What to do with a source file whose rows may already be stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadAction {
    /// Leave the stored rows alone and load nothing
    Skip,
    /// Delete the stored rows for the file, then load
    Replace,
    /// Load alongside whatever is stored (may duplicate rows)
    Append,
}

impl std::str::FromStr for LoadAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "skip" => Ok(LoadAction::Skip),
            "replace" => Ok(LoadAction::Replace),
            "append" => Ok(LoadAction::Append),
            _ => Err(format!(
                "Unknown load action: {}. Use 'skip', 'replace' or 'append'.",
                s
            )),
        }
    }
}

impl std::fmt::Display for LoadAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadAction::Skip => write!(f, "skip"),
            LoadAction::Replace => write!(f, "replace"),
            LoadAction::Append => write!(f, "append"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_names_round_trip() {
        for field in CanonicalField::SOURCE {
            assert_eq!(
                CanonicalField::from_source_name(field.column_name()),
                Some(field)
            );
        }
        assert_eq!(CanonicalField::from_source_name("ARCHIVO_ORIGEN"), None);
        assert_eq!(CanonicalField::from_source_name("PROTECCION _OPERADA"), None);
    }

    #[test]
    fn test_field_kinds() {
        assert_eq!(CanonicalField::FechaHoraApertura.kind(), FieldKind::Timestamp);
        assert_eq!(CanonicalField::CargaMegas.kind(), FieldKind::Number);
        assert_eq!(CanonicalField::Region.kind(), FieldKind::Text);
        assert_eq!(CanonicalField::ArchivoOrigen.kind(), FieldKind::Text);
    }

    #[test]
    fn test_serde_uses_column_names() {
        let json = serde_json::to_string(&CanonicalField::DuracionIndisponibilidadMinutos).unwrap();
        assert_eq!(json, "\"DURACION_INDISPONIBILIDAD_MINUTOS\"");
    }

    #[test]
    fn test_load_action_from_str() {
        assert_eq!("skip".parse::<LoadAction>().unwrap(), LoadAction::Skip);
        assert_eq!("REPLACE".parse::<LoadAction>().unwrap(), LoadAction::Replace);
        assert_eq!(" append ".parse::<LoadAction>().unwrap(), LoadAction::Append);
        assert!("merge".parse::<LoadAction>().is_err());
    }
}
