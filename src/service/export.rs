use crate::model::voter::VoterCore;

/// The fixed column header of the voter export.
pub const CSV_HEADER: &str =
    "DNI,Nombres,Apellidos,Fecha Nacimiento,Tipo Usuario,Departamento,Ha Votado,Elección,Registrado";

/// Serialise the (already filtered) voter rows as CSV.
///
/// A pure formatting function: comma-joined fixed columns under a header
/// row, voted flag rendered `Sí`/`No`, absent election name rendered `N/A`.
pub fn voters_csv(voters: &[VoterCore]) -> String {
    let mut lines = Vec::with_capacity(voters.len() + 1);
    lines.push(CSV_HEADER.to_string());
    for voter in voters {
        lines.push(
            [
                voter.dni.as_str().to_string(),
                voter.first_names.clone(),
                voter.last_names.clone(),
                voter.birth_date.format("%Y-%m-%d").to_string(),
                voter.role.to_string(),
                voter.department.clone(),
                if voter.has_voted { "Sí" } else { "No" }.to_string(),
                voter
                    .election_name
                    .clone()
                    .unwrap_or_else(|| "N/A".to_string()),
                voter.registered_at.format("%Y-%m-%d").to_string(),
            ]
            .join(","),
        );
    }
    lines.join("\n")
}
