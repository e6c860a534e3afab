//! Column names shared by the exports, lookups and derived metrics

// Primary gestion export
pub const NUMERO_OPERACION: &str = "NumeroOperacion";
pub const CODIGO_TIPO_CONTACTO: &str = "CodigoTipoContacto";
pub const RESPUESTA: &str = "Respuesta";
pub const IDENTIFICACION: &str = "Identificacion";
pub const TELEFONO: &str = "Telefono";
pub const ETAPA: &str = "Etapa";
pub const ES_COMPROMISO: &str = "EsCompromiso";
pub const PRODUCTO_GESTION: &str = "ProductoGestion";
pub const ES_GESTOR: &str = "EsGestor";
pub const ESTRATEGIA: &str = "Estrategia";
pub const GESTOR: &str = "Gestor";
pub const SUPERVISOR: &str = "Supervisor";
pub const HORA: &str = "Hora";
pub const HORA_GESTION: &str = "HoraGestion";
pub const FECHA_GESTION: &str = "FechaGestion";
pub const OBSERVACION: &str = "Observacion";

// Lookup attributes
pub const TIPO_CONTACTO: &str = "TipoContacto";
pub const PRODUCTO: &str = "Producto";
pub const ORDEN: &str = "Orden";
pub const DIA_SEMANA: &str = "DiaSemana";
pub const MES_DIA: &str = "MesDia";

// Derived
pub const ES_CONTACTO: &str = "EsContacto";
pub const ES_CONTACTO_DIRECTO: &str = "EsContactoDirecto";
pub const ROBOT: &str = "Robot";
pub const GESTIONES: &str = "Gestiones";
pub const CD: &str = "CD";
pub const CONTACTO: &str = "Contacto";
pub const CONTACTO_DIRECTO: &str = "ContactoDirecto";
pub const COMPROMISOS: &str = "Compromisos";

/// Columns the detail view shows, when present
pub const DETAIL_COLUMNS: [&str; 7] = [
    GESTOR,
    IDENTIFICACION,
    TELEFONO,
    HORA_GESTION,
    RESPUESTA,
    TIPO_CONTACTO,
    OBSERVACION,
];
