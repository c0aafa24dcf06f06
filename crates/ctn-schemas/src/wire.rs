//! Wire DTOs for the cafeteria REST API.
//!
//! The backend is duck-typed JSON; every payload is deserialized into one of
//! these DTOs and then converted into a validated domain type via
//! `into_domain`, failing fast with [`SchemaError`] on shape mismatches
//! instead of propagating undefined fields. Field names mirror the wire
//! exactly (Spanish, as the API defines them); domain types are English.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{CatalogItem, Money, Preorder, SchemaError, Student};

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// `GET /api/alimentos/` row.
#[derive(Debug, Clone, Deserialize)]
pub struct AlimentoDto {
    pub id: i64,
    pub nombre: String,
    pub precio: f64,
    pub cantidad_en_stock: i64,
    #[serde(default)]
    pub categoria: Option<String>,
    #[serde(default)]
    pub calorias: Option<i64>,
    #[serde(default)]
    pub imagen: Option<String>,
}

impl AlimentoDto {
    pub fn into_domain(self) -> Result<CatalogItem, SchemaError> {
        if self.nombre.trim().is_empty() {
            return Err(SchemaError::EmptyField { field: "nombre" });
        }
        let price = Money::from_decimal(self.precio)
            .map_err(|source| SchemaError::Money { field: "precio", source })?;
        if price.is_negative() {
            return Err(SchemaError::NegativeAmount { field: "precio" });
        }
        let stock = u32::try_from(self.cantidad_en_stock).map_err(|_| SchemaError::BadCount {
            field: "cantidad_en_stock",
            got: self.cantidad_en_stock,
        })?;
        let calories_raw = self.calorias.unwrap_or(0);
        let calories = u32::try_from(calories_raw).map_err(|_| SchemaError::BadCount {
            field: "calorias",
            got: calories_raw,
        })?;
        Ok(CatalogItem {
            id: self.id,
            name: self.nombre,
            price,
            stock,
            // The portal renders uncategorized items under a fixed label.
            category: self.categoria.unwrap_or_else(|| "Sin categoría".to_string()),
            calories,
        })
    }
}

/// `GET /estudiantes/{id}/alimentosBloqueados` row.
#[derive(Debug, Clone, Deserialize)]
pub struct BloqueadoDto {
    pub id_alimento: i64,
}

// ---------------------------------------------------------------------------
// Students
// ---------------------------------------------------------------------------

/// Student payload (`GET /estudiantes/cedula/{cedula}`, debit response).
#[derive(Debug, Clone, Deserialize)]
pub struct EstudianteDto {
    pub id: i64,
    pub nombre: String,
    pub cedula: String,
    pub saldo: f64,
    /// Absent on older payloads; zero means no limit configured.
    #[serde(default)]
    pub limite_diario: Option<f64>,
}

impl EstudianteDto {
    pub fn into_domain(self) -> Result<Student, SchemaError> {
        let balance = Money::from_decimal(self.saldo)
            .map_err(|source| SchemaError::Money { field: "saldo", source })?;
        let daily_limit = Money::from_decimal(self.limite_diario.unwrap_or(0.0))
            .map_err(|source| SchemaError::Money {
                field: "limite_diario",
                source,
            })?;
        Ok(Student {
            id: self.id,
            cedula: self.cedula,
            name: self.nombre,
            balance,
            daily_limit,
        })
    }
}

/// `POST /estudiantes/{id}/descargaSaldo` body.
#[derive(Debug, Clone, Serialize)]
pub struct DescargaSaldoDto {
    pub monto: f64,
}

// ---------------------------------------------------------------------------
// Preorders
// ---------------------------------------------------------------------------

/// One line of a `POST /api/precompras/nueva` body.
#[derive(Debug, Clone, Serialize)]
pub struct PrecompraItemDto {
    pub producto_id: i64,
    pub cantidad: u32,
}

/// `POST /api/precompras/nueva` body.
#[derive(Debug, Clone, Serialize)]
pub struct PrecompraNuevaDto {
    pub estudiante_id: i64,
    pub items: Vec<PrecompraItemDto>,
    pub costo_adicional: f64,
}

/// Preorder payload (`/api/precompras/*` responses).
#[derive(Debug, Clone, Deserialize)]
pub struct PrecompraDto {
    pub id: i64,
    pub id_estudiante: i64,
    pub fecha_precompra: DateTime<Utc>,
    pub costo_total: f64,
    #[serde(default)]
    pub costo_adicional: f64,
    pub entregado: bool,
    #[serde(default)]
    pub fecha_entrega: Option<DateTime<Utc>>,
}

impl PrecompraDto {
    pub fn into_domain(self) -> Result<Preorder, SchemaError> {
        let total = Money::from_decimal(self.costo_total)
            .map_err(|source| SchemaError::Money { field: "costo_total", source })?;
        if total.is_negative() {
            return Err(SchemaError::NegativeAmount { field: "costo_total" });
        }
        let surcharge = Money::from_decimal(self.costo_adicional)
            .map_err(|source| SchemaError::Money { field: "costo_adicional", source })?;
        Ok(Preorder {
            id: self.id,
            student_id: self.id_estudiante,
            total,
            surcharge,
            created_at: self.fecha_precompra,
            delivered: self.entregado,
            delivered_at: self.fecha_entrega,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alimento_valid_row_parses() {
        let dto: AlimentoDto = serde_json::from_str(
            r#"{"id":7,"nombre":"Empanada","precio":2500.0,"cantidad_en_stock":12,
                "categoria":"Fritos","calorias":320,"imagen":null}"#,
        )
        .unwrap();
        let item = dto.into_domain().unwrap();
        assert_eq!(item.id, 7);
        assert_eq!(item.price, Money::from_pesos(2_500));
        assert_eq!(item.stock, 12);
        assert_eq!(item.calories, 320);
    }

    #[test]
    fn alimento_missing_category_gets_label() {
        let dto: AlimentoDto = serde_json::from_str(
            r#"{"id":1,"nombre":"Agua","precio":1000.0,"cantidad_en_stock":5}"#,
        )
        .unwrap();
        assert_eq!(dto.into_domain().unwrap().category, "Sin categoría");
    }

    #[test]
    fn alimento_negative_stock_is_schema_error() {
        let dto: AlimentoDto = serde_json::from_str(
            r#"{"id":1,"nombre":"Agua","precio":1000.0,"cantidad_en_stock":-3}"#,
        )
        .unwrap();
        assert_eq!(
            dto.into_domain(),
            Err(SchemaError::BadCount {
                field: "cantidad_en_stock",
                got: -3
            })
        );
    }

    #[test]
    fn alimento_empty_name_is_schema_error() {
        let dto: AlimentoDto = serde_json::from_str(
            r#"{"id":1,"nombre":"  ","precio":1000.0,"cantidad_en_stock":3}"#,
        )
        .unwrap();
        assert_eq!(
            dto.into_domain(),
            Err(SchemaError::EmptyField { field: "nombre" })
        );
    }

    #[test]
    fn estudiante_parses_balance_to_micros() {
        let dto: EstudianteDto = serde_json::from_str(
            r#"{"id":3,"nombre":"Ana","cedula":"1002003004","saldo":20000.0,
                "email":"x@y.z","responsableFinanciero":"Luz"}"#,
        )
        .unwrap();
        let s = dto.into_domain().unwrap();
        assert_eq!(s.balance, Money::from_pesos(20_000));
        assert_eq!(s.cedula, "1002003004");
        // Payload without limite_diario: no limit configured.
        assert_eq!(s.daily_limit, Money::ZERO);
    }

    #[test]
    fn estudiante_parses_daily_limit_when_present() {
        let dto: EstudianteDto = serde_json::from_str(
            r#"{"id":3,"nombre":"Ana","cedula":"1002003004","saldo":20000.0,
                "limite_diario":15000.0}"#,
        )
        .unwrap();
        assert_eq!(
            dto.into_domain().unwrap().daily_limit,
            Money::from_pesos(15_000)
        );
    }

    #[test]
    fn precompra_parses_delivery_fields() {
        let dto: PrecompraDto = serde_json::from_str(
            r#"{"id":42,"id_compra":9,"id_estudiante":3,
                "fecha_precompra":"2026-08-30T12:00:00Z","costo_total":13100.0,
                "costo_adicional":100.0,"entregado":false,"fecha_entrega":null,
                "activo":true,"fecha_creacion":"2026-08-30T12:00:00Z",
                "fecha_actualizacion":"2026-08-30T12:00:00Z"}"#,
        )
        .unwrap();
        let p = dto.into_domain().unwrap();
        assert_eq!(p.id, 42);
        assert_eq!(p.total, Money::from_pesos(13_100));
        assert!(!p.delivered);
        assert!(p.delivered_at.is_none());
    }

    #[test]
    fn nueva_precompra_serializes_wire_names() {
        let body = PrecompraNuevaDto {
            estudiante_id: 3,
            items: vec![PrecompraItemDto {
                producto_id: 7,
                cantidad: 2,
            }],
            costo_adicional: 100.0,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["estudiante_id"], 3);
        assert_eq!(json["items"][0]["producto_id"], 7);
        assert_eq!(json["costo_adicional"], 100.0);
    }
}
