use crate::{ClienteOutcome, ClienteSummary, Sucursal};

/// Shapes the upstream records of one cliente into a lookup outcome.
///
/// Only records with usable GPS count as sucursales; the customer-level
/// fields always come from the first upstream record.
pub fn resolve_cliente(records: Vec<Sucursal>) -> ClienteOutcome {
    let Some(first) = records.first() else {
        return ClienteOutcome::NotFound;
    };
    let cliente = ClienteSummary::from(first);

    let mut located: Vec<Sucursal> = records
        .into_iter()
        .filter(Sucursal::has_valid_gps)
        .collect();

    match located.len() {
        0 => ClienteOutcome::SinGps(cliente),
        1 => ClienteOutcome::Single(located.remove(0)),
        _ => ClienteOutcome::Multiple {
            cliente,
            sucursales: located,
        },
    }
}
