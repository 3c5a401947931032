//! Typed outage rows in the canonical schema

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::enums::{CanonicalField, FieldKind};

/// Borrowed view of one field of a [`CanonicalRow`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Text(Option<&'a str>),
    Timestamp(Option<NaiveDateTime>),
    Number(Option<f64>),
}

impl FieldValue<'_> {
    pub fn is_null(&self) -> bool {
        match self {
            FieldValue::Text(v) => v.is_none(),
            FieldValue::Timestamp(v) => v.is_none(),
            FieldValue::Number(v) => v.is_none(),
        }
    }
}

/// One normalized outage event
///
/// The opening timestamp and the source file are always present; everything
/// else may be null. Numeric fields are never negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct CanonicalRow {
    pub fecha_hora_apertura: NaiveDateTime,
    pub fecha_hora_cierre: Option<NaiveDateTime>,
    pub duracion_indisponibilidad_minutos: Option<f64>,
    pub carga_megas: Option<f64>,
    pub codigo_elemento_afectado: Option<String>,
    pub tipo_equipo: Option<String>,
    pub circuitos_afectados: Option<String>,
    pub subestacion: Option<String>,
    pub region: Option<String>,
    pub codigo_interruptor: Option<String>,
    pub nivel_de_tension: Option<String>,
    pub proteccion_operada: Option<String>,
    pub origen_indisponibilidad: Option<String>,
    pub causa_evento: Option<String>,
    pub excepciones: Option<String>,
    pub tipo_indisponibilidad: Option<String>,
    pub tipo_mantenimiento: Option<String>,
    pub descripcion_evento: Option<String>,
    pub archivo_origen: String,
    /// Set only when the row replaces a previous load of the same file
    pub fecha_actualizacion: Option<NaiveDateTime>,
}

impl CanonicalRow {
    /// Create a row with only the mandatory fields set
    pub fn new(fecha_hora_apertura: NaiveDateTime, archivo_origen: impl Into<String>) -> Self {
        Self {
            fecha_hora_apertura,
            fecha_hora_cierre: None,
            duracion_indisponibilidad_minutos: None,
            carga_megas: None,
            codigo_elemento_afectado: None,
            tipo_equipo: None,
            circuitos_afectados: None,
            subestacion: None,
            region: None,
            codigo_interruptor: None,
            nivel_de_tension: None,
            proteccion_operada: None,
            origen_indisponibilidad: None,
            causa_evento: None,
            excepciones: None,
            tipo_indisponibilidad: None,
            tipo_mantenimiento: None,
            descripcion_evento: None,
            archivo_origen: archivo_origen.into(),
            fecha_actualizacion: None,
        }
    }

    fn text_slot(&self, field: CanonicalField) -> Option<&Option<String>> {
        Some(match field {
            CanonicalField::CodigoElementoAfectado => &self.codigo_elemento_afectado,
            CanonicalField::TipoEquipo => &self.tipo_equipo,
            CanonicalField::CircuitosAfectados => &self.circuitos_afectados,
            CanonicalField::Subestacion => &self.subestacion,
            CanonicalField::Region => &self.region,
            CanonicalField::CodigoInterruptor => &self.codigo_interruptor,
            CanonicalField::NivelDeTension => &self.nivel_de_tension,
            CanonicalField::ProteccionOperada => &self.proteccion_operada,
            CanonicalField::OrigenIndisponibilidad => &self.origen_indisponibilidad,
            CanonicalField::CausaEvento => &self.causa_evento,
            CanonicalField::Excepciones => &self.excepciones,
            CanonicalField::TipoIndisponibilidad => &self.tipo_indisponibilidad,
            CanonicalField::TipoMantenimiento => &self.tipo_mantenimiento,
            CanonicalField::DescripcionEvento => &self.descripcion_evento,
            _ => return None,
        })
    }

    fn text_slot_mut(&mut self, field: CanonicalField) -> Option<&mut Option<String>> {
        Some(match field {
            CanonicalField::CodigoElementoAfectado => &mut self.codigo_elemento_afectado,
            CanonicalField::TipoEquipo => &mut self.tipo_equipo,
            CanonicalField::CircuitosAfectados => &mut self.circuitos_afectados,
            CanonicalField::Subestacion => &mut self.subestacion,
            CanonicalField::Region => &mut self.region,
            CanonicalField::CodigoInterruptor => &mut self.codigo_interruptor,
            CanonicalField::NivelDeTension => &mut self.nivel_de_tension,
            CanonicalField::ProteccionOperada => &mut self.proteccion_operada,
            CanonicalField::OrigenIndisponibilidad => &mut self.origen_indisponibilidad,
            CanonicalField::CausaEvento => &mut self.causa_evento,
            CanonicalField::Excepciones => &mut self.excepciones,
            CanonicalField::TipoIndisponibilidad => &mut self.tipo_indisponibilidad,
            CanonicalField::TipoMantenimiento => &mut self.tipo_mantenimiento,
            CanonicalField::DescripcionEvento => &mut self.descripcion_evento,
            _ => return None,
        })
    }

    /// Read any field; `FECHA_CARGA` is store-side and always reads as null
    pub fn value(&self, field: CanonicalField) -> FieldValue<'_> {
        match field {
            CanonicalField::FechaHoraApertura => {
                FieldValue::Timestamp(Some(self.fecha_hora_apertura))
            }
            CanonicalField::FechaHoraCierre => FieldValue::Timestamp(self.fecha_hora_cierre),
            CanonicalField::FechaActualizacion => FieldValue::Timestamp(self.fecha_actualizacion),
            CanonicalField::FechaCarga => FieldValue::Timestamp(None),
            CanonicalField::DuracionIndisponibilidadMinutos => {
                FieldValue::Number(self.duracion_indisponibilidad_minutos)
            }
            CanonicalField::CargaMegas => FieldValue::Number(self.carga_megas),
            CanonicalField::ArchivoOrigen => FieldValue::Text(Some(&self.archivo_origen)),
            other => FieldValue::Text(self.text_slot(other).and_then(|v| v.as_deref())),
        }
    }

    /// Set a text field; ignored for non-text fields
    pub fn set_text(&mut self, field: CanonicalField, value: Option<String>) {
        debug_assert_eq!(field.kind(), FieldKind::Text);
        if let Some(slot) = self.text_slot_mut(field) {
            *slot = value;
        }
    }

    /// Set an optional timestamp field; the opening timestamp is set through
    /// [`CanonicalRow::new`]
    pub fn set_timestamp(&mut self, field: CanonicalField, value: Option<NaiveDateTime>) {
        match field {
            CanonicalField::FechaHoraCierre => self.fecha_hora_cierre = value,
            CanonicalField::FechaActualizacion => self.fecha_actualizacion = value,
            _ => {}
        }
    }

    pub fn set_number(&mut self, field: CanonicalField, value: Option<f64>) {
        match field {
            CanonicalField::DuracionIndisponibilidadMinutos => {
                self.duracion_indisponibilidad_minutos = value
            }
            CanonicalField::CargaMegas => self.carga_megas = value,
            _ => {}
        }
    }
}
