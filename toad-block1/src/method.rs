use toad_msg::Code;

use crate::coap_code;

/// Request method used for every block of an upload
///
/// RFC7959 allows Block1 on any request that carries a body;
/// LwM2M firmware pushes use [`Method::PUT`] on `/5/0/0`,
/// custom object uploads usually [`Method::POST`].
///
/// The codes are spelled out here rather than taken from
/// `toad_msg::Code::{POST, PUT}`; toad-msg 0.18 has those two swapped.
#[derive(Debug, Copy, Clone, PartialEq, PartialOrd)]
pub struct Method(pub(crate) Code);

impl Method {
  coap_code!(rfc7252("5.8.2") POST = Method(0*02));
  coap_code!(rfc7252("5.8.3") PUT  = Method(0*03));

  /// The message code this method is sent as
  pub fn code(&self) -> Code {
    self.0
  }
}

impl Default for Method {
  fn default() -> Self {
    Method::POST
  }
}

impl core::fmt::Display for Method {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    match self.0 {
      | Code { class: 0, detail: 2 } => write!(f, "POST"),
      | Code { class: 0, detail: 3 } => write!(f, "PUT"),
      | Code { class, detail } => write!(f, "{}.{:02}", class, detail),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn display() {
    assert_eq!(format!("{}", Method::POST), "POST");
    assert_eq!(format!("{}", Method::PUT), "PUT");
  }

  #[test]
  fn default_is_post() {
    assert_eq!(Method::default().code(), Code::new(0, 2));
    assert_eq!(Method::PUT.code(), Code::new(0, 3));
  }
}
