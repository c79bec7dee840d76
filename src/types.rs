use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

const ID: &str = "id";
const NOMBRE: &str = "nombre";
const LATITUD: &str = "latitud";
const LONGITUD: &str = "longitud";
const VENDEDOR_NOMBRE: &str = "vendedorNombre";
const VENDEDOR_TELEFONO: &str = "vendedorTelefono";

static NULL: JsonValue = JsonValue::Null;

/// One branch record as returned by `/clientes/app-search`.
///
/// The upstream object is kept as-is and serialized back unchanged; only
/// `latitud`/`longitud` are interpreted, and only when they are numbers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sucursal(Map<String, JsonValue>);

impl Sucursal {
    /// Upstream value of `key`, `null` when the key is absent.
    pub fn field(&self, key: &str) -> &JsonValue {
        self.0.get(key).unwrap_or(&NULL)
    }

    pub fn id(&self) -> &JsonValue {
        self.field(ID)
    }

    pub fn nombre(&self) -> &JsonValue {
        self.field(NOMBRE)
    }

    pub fn latitud(&self) -> Option<f64> {
        self.field(LATITUD).as_f64()
    }

    pub fn longitud(&self) -> Option<f64> {
        self.field(LONGITUD).as_f64()
    }

    /// Both coordinates present, finite and non-zero.
    pub fn has_valid_gps(&self) -> bool {
        matches!(
            (self.latitud(), self.longitud()),
            (Some(lat), Some(lng)) if is_usable_coordinate(lat) && is_usable_coordinate(lng)
        )
    }

    /// `true` when the vendedor name or phone is absent or `null`.
    pub fn lacks_vendedor(&self) -> bool {
        self.field(VENDEDOR_NOMBRE).is_null() || self.field(VENDEDOR_TELEFONO).is_null()
    }

    /// Fills absent or `null` vendedor fields; upstream values always win.
    pub fn fill_vendedor(&mut self, vendedor: &Vendedor) {
        if self.field(VENDEDOR_NOMBRE).is_null() {
            self.0.insert(
                VENDEDOR_NOMBRE.to_owned(),
                JsonValue::String(vendedor.nombre.clone()),
            );
        }
        if let Some(telefono) = &vendedor.telefono {
            if self.field(VENDEDOR_TELEFONO).is_null() {
                self.0.insert(
                    VENDEDOR_TELEFONO.to_owned(),
                    JsonValue::String(telefono.clone()),
                );
            }
        }
    }
}

fn is_usable_coordinate(value: f64) -> bool {
    value.is_finite() && value != 0.0
}

/// Customer-level fields shared by the `sinGPS` and `multipleSucursales`
/// responses. Upstream values are copied untouched, `null` when absent.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClienteSummary {
    pub id: JsonValue,
    pub nombre: JsonValue,
    pub vendedor_nombre: JsonValue,
    pub vendedor_telefono: JsonValue,
}

impl From<&Sucursal> for ClienteSummary {
    fn from(sucursal: &Sucursal) -> Self {
        Self {
            id: sucursal.id().clone(),
            nombre: sucursal.nombre().clone(),
            vendedor_nombre: sucursal.field(VENDEDOR_NOMBRE).clone(),
            vendedor_telefono: sucursal.field(VENDEDOR_TELEFONO).clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ClienteOutcome {
    NotFound,
    SinGps(ClienteSummary),
    Single(Sucursal),
    Multiple {
        cliente: ClienteSummary,
        sucursales: Vec<Sucursal>,
    },
}

/// Salesperson entry of the [`crate::VendedorDirectory`].
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Vendedor {
    pub cliente: String,
    pub nombre: String,
    #[serde(default)]
    pub telefono: Option<String>,
}
