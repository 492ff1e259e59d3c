use serde::{Deserialize, Serialize};

const DEFAULT_CLASS_NAMES: &[&str] = &[
    "logo",
    "R.U.C",
    "numero_factura",
    "fecha_hora",
    "razon_social",
    "cantidad",
    "descripcion",
    "precio_unitario",
    "precio_total",
    "subtotal",
    "iva",
    "Descripcion",
    "Cantidad",
    "unidades",
    "unidad",
    "Cajas_cantidad",
    "Articulo",
    "Nombre_del_producto",
];

/// Detector class id to class name table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassNames(Vec<String>);

impl Default for ClassNames {
    fn default() -> Self {
        Self(DEFAULT_CLASS_NAMES.iter().map(|s| s.to_string()).collect())
    }
}

impl ClassNames {
    pub fn new(names: Vec<String>) -> Self {
        Self(names)
    }

    /// Unknown ids resolve to `Clase_<id>`.
    pub fn name(&self, id: usize) -> String {
        self.0
            .get(id)
            .cloned()
            .unwrap_or_else(|| format!("Clase_{id}"))
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.0.iter().enumerate().map(|(id, name)| (id, name.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
